mod context;
mod evaluator;
mod parser;
mod registration;
mod wrapper;

#[cfg(test)]
mod tests;

use tree_sitter::Node;

use crate::error::AnalyzerError;
use context::AnalyzerContext;
pub use context::{Registration, ScriptAnalysis, SkippedCall};
pub use evaluator::{Env, Evaluator};
pub use parser::JsParser;

/// 登録呼び出しのレシーバー（`RED.nodes.registerType`）
const REGISTRATION_ROOT: &str = "RED";
const REGISTRATION_NAMESPACE: &str = "nodes";
const REGISTRATION_METHOD: &str = "registerType";

/// エディタ用スクリプトからノード型の登録を抽出するアナライザー
///
/// スクリプトは構文木として扱うのみで、実行はしない
#[derive(Debug, Default)]
pub struct RegistrationAnalyzer;

impl RegistrationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// スクリプトを解析して登録呼び出しを抽出する
    ///
    /// 構文エラーを含むスクリプトは登録なしとしてエラーを返す
    pub fn analyze(&self, source: &str) -> Result<ScriptAnalysis, AnalyzerError> {
        let mut parser = JsParser::new();
        let tree = parser.parse_strict(source)?;
        let root = tree.root_node();

        let mut ctx = AnalyzerContext::new();
        // Pass 1: ラッパー関数の収集
        self.collect_wrappers(root, source, &mut ctx);
        // Pass 2: 呼び出しの解決
        let mut result = ScriptAnalysis::default();
        self.collect_registrations(root, source, &ctx, &mut result);

        Ok(result)
    }

    /// `RED.nodes.registerType(...)` の形の呼び出しかどうか
    pub(super) fn is_registration_call(&self, call: Node, source: &str) -> bool {
        let Some(callee) = call.child_by_field_name("function") else {
            return false;
        };
        if callee.kind() != "member_expression" {
            return false;
        }
        let (Some(namespace), Some(method)) = (
            callee.child_by_field_name("object"),
            callee.child_by_field_name("property"),
        ) else {
            return false;
        };
        if &source[method.byte_range()] != REGISTRATION_METHOD || namespace.kind() != "member_expression" {
            return false;
        }
        let (Some(root), Some(property)) = (
            namespace.child_by_field_name("object"),
            namespace.child_by_field_name("property"),
        ) else {
            return false;
        };

        root.kind() == "identifier"
            && &source[root.byte_range()] == REGISTRATION_ROOT
            && &source[property.byte_range()] == REGISTRATION_NAMESPACE
    }

    /// 呼び出しの引数ノード（コメントを除く）
    pub(super) fn call_arguments<'tree>(&self, call: Node<'tree>) -> Vec<Node<'tree>> {
        call.child_by_field_name("arguments")
            .filter(|args| args.kind() == "arguments")
            .map(evaluator::named_children)
            .unwrap_or_default()
    }

    /// 登録呼び出しの (型名引数, オプション引数)
    pub(super) fn registration_args<'tree>(&self, call: Node<'tree>) -> Option<(Node<'tree>, Node<'tree>)> {
        let args = self.call_arguments(call);
        match args.as_slice() {
            [type_arg, options_arg, ..] => Some((*type_arg, *options_arg)),
            _ => None,
        }
    }
}
