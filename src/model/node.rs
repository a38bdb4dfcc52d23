use serde::Serialize;

use super::value::{EvaluatedValue, ObjectMap};

/// ヘルプ・テンプレートのHTMLとプレーンテキスト
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HtmlText {
    pub html: String,
    pub text: String,
}

impl HtmlText {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// 編集テンプレートから抽出したフォームフィールド名
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TemplateFields {
    /// `node-input-<name>`
    pub own: Vec<String>,
    /// `node-config-input-<name>`
    pub nested: Vec<String>,
    /// own と nested の出現順の和集合
    pub all: Vec<String>,
}

impl TemplateFields {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// モジュール名とその分解結果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleName {
    pub name: String,
    pub package: String,
    pub set: Option<String>,
}

/// カタログ内の1ノード型
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub node_type: String,
    pub module: Option<String>,
    pub module_package: Option<String>,
    pub module_set: Option<String>,
    pub category: Option<EvaluatedValue>,
    pub palette_label: Option<EvaluatedValue>,
    pub color: Option<EvaluatedValue>,
    pub icon: Option<EvaluatedValue>,
    pub align: Option<EvaluatedValue>,
    pub inputs: Option<EvaluatedValue>,
    pub outputs: Option<EvaluatedValue>,
    pub output_labels: Option<EvaluatedValue>,
    pub defaults: ObjectMap,
    pub options: ObjectMap,
    pub options_source: Option<String>,
    pub help: HtmlText,
    pub template: HtmlText,
    pub template_fields: TemplateFields,
    pub is_custom: bool,
}

impl NodeRecord {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    /// カテゴリ名（文字列リテラルの場合のみ）
    pub fn category_text(&self) -> Option<String> {
        self.category.as_ref().and_then(EvaluatedValue::as_text)
    }

    /// パレットラベル（文字列リテラルの場合のみ）
    pub fn palette_label_text(&self) -> Option<String> {
        self.palette_label.as_ref().and_then(EvaluatedValue::as_text)
    }

    /// モジュール帰属を上書き（常に最後の書き込みが勝つ）
    pub fn set_module(&mut self, module: &ModuleName) {
        self.module = Some(module.name.clone());
        self.module_package = Some(module.package.clone());
        self.module_set = module.set.clone();
    }
}
