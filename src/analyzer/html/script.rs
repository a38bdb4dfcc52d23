//! モジュール断片内の <script> 要素の分類

use phf::phf_set;
use tree_sitter::Node;

use super::super::HtmlParser;
use super::{find_child_by_kind, node_text, tag_attributes};

/// 登録スクリプトとして扱う type 属性
static EXECUTABLE_SCRIPT_TYPES: phf::Set<&'static str> = phf_set! {
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
    "module",
};

/// ノード型名に紐づくHTML断片（ヘルプ or 編集テンプレート）
#[derive(Clone, Debug, PartialEq)]
pub struct TypedFragment {
    pub node_type: String,
    pub html: String,
}

/// 1モジュール分の分類結果（出現順）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleContent {
    pub help: Vec<TypedFragment>,
    pub templates: Vec<TypedFragment>,
    pub scripts: Vec<String>,
}

/// script要素の種類
enum ScriptKind {
    Help(String),
    Template(String),
    Registration,
    Other,
}

/// モジュール断片から help / template / 登録スクリプトを抽出する
pub fn extract_module_content(html: &str) -> ModuleContent {
    let mut content = ModuleContent::default();
    let mut parser = HtmlParser::new();

    if let Some(tree) = parser.parse(html) {
        collect_scripts_from_node(tree.root_node(), html, &mut content);
    }

    content
}

/// 再帰的に <script> 要素を収集
fn collect_scripts_from_node(node: Node, source: &str, content: &mut ModuleContent) {
    if node.kind() == "script_element" {
        let body = find_child_by_kind(node, "raw_text")
            .map(|raw| node_text(raw, source))
            .unwrap_or("");

        match classify_script(node, source) {
            ScriptKind::Help(node_type) => content.help.push(TypedFragment {
                node_type,
                html: body.to_string(),
            }),
            ScriptKind::Template(node_type) => content.templates.push(TypedFragment {
                node_type,
                html: body.to_string(),
            }),
            ScriptKind::Registration if !body.trim().is_empty() => {
                content.scripts.push(body.to_string());
            }
            _ => {}
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_scripts_from_node(child, source, content);
    }
}

fn classify_script(node: Node, source: &str) -> ScriptKind {
    let Some(start_tag) = find_child_by_kind(node, "start_tag") else {
        return ScriptKind::Other;
    };

    let mut script_type: Option<String> = None;
    for (name, value) in tag_attributes(start_tag, source) {
        match name.as_str() {
            "data-help-name" => {
                if let Some(node_type) = value.filter(|v| !v.is_empty()) {
                    return ScriptKind::Help(node_type);
                }
            }
            "data-template-name" => {
                if let Some(node_type) = value.filter(|v| !v.is_empty()) {
                    return ScriptKind::Template(node_type);
                }
            }
            "type" => script_type = value,
            _ => {}
        }
    }

    match script_type {
        None => ScriptKind::Registration,
        Some(t) if t.trim().is_empty() => ScriptKind::Registration,
        Some(t) if EXECUTABLE_SCRIPT_TYPES.contains(t.trim().to_ascii_lowercase().as_str()) => {
            ScriptKind::Registration
        }
        Some(_) => ScriptKind::Other,
    }
}
