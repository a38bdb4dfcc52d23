use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::model::ObjectMap;

/// 型名を引数で受け取って登録を行うローカル関数
///
/// 1つのスクリプト内でのみ有効で、カタログには保存しない
#[derive(Clone, Debug)]
pub(super) struct WrapperBinding<'tree> {
    /// パラメータ名（宣言順）
    pub(super) params: Vec<String>,
    /// 登録型名として渡されるパラメータ名
    pub(super) type_param: String,
    /// 登録呼び出しに渡されるオブジェクトリテラル
    pub(super) options: Node<'tree>,
}

/// 受理された登録呼び出し
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub node_type: String,
    pub options: ObjectMap,
    /// オプションリテラルのソーステキスト
    pub options_source: String,
}

/// スキップされた登録呼び出し
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedCall {
    /// 1始まりの行番号
    pub line: u32,
    pub reason: String,
}

/// 1スクリプトの解析結果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptAnalysis {
    pub registrations: Vec<Registration>,
    pub skipped: Vec<SkippedCall>,
}

/// 解析コンテキスト（Pass 1 で収集し Pass 2 で参照する）
pub(super) struct AnalyzerContext<'tree> {
    /// 関数名 -> ラッパー情報（同名は後勝ち）
    pub(super) wrappers: HashMap<String, WrapperBinding<'tree>>,
    /// ラッパー本体内の登録呼び出し（ノードID）
    pub(super) wrapper_calls: HashSet<usize>,
}

impl<'tree> AnalyzerContext<'tree> {
    pub(super) fn new() -> Self {
        Self {
            wrappers: HashMap::new(),
            wrapper_calls: HashSet::new(),
        }
    }

    pub(super) fn add_wrapper(&mut self, name: String, call: Node<'tree>, binding: WrapperBinding<'tree>) {
        self.wrapper_calls.insert(call.id());
        self.wrappers.insert(name, binding);
    }

    pub(super) fn is_wrapper_call(&self, call: Node) -> bool {
        self.wrapper_calls.contains(&call.id())
    }

    pub(super) fn get_wrapper(&self, name: &str) -> Option<&WrapperBinding<'tree>> {
        self.wrappers.get(name)
    }
}
