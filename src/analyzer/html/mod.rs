//! エディタHTMLの解析（モジュール分割・script要素の分類・テンプレート項目抽出）

use tree_sitter::Node;

pub mod module;
pub mod script;
pub mod template_fields;
pub mod text;

pub use module::{parse_module_name, split_modules, ModuleBlock};
pub use script::{extract_module_content, ModuleContent, TypedFragment};
pub use template_fields::extract_template_fields;
pub use text::html_to_text;

/// 指定した種類の子ノードを検索
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
    }
    None
}

/// ノードのテキストを取得
pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// start_tag の属性を (小文字の属性名, 値) の列として取得
///
/// 値のない属性（`<input disabled>`）は None
pub(crate) fn tag_attributes(start_tag: Node, source: &str) -> Vec<(String, Option<String>)> {
    let mut attributes = Vec::new();

    let mut cursor = start_tag.walk();
    for child in start_tag.children(&mut cursor) {
        if child.kind() != "attribute" {
            continue;
        }
        let Some(name_node) = find_child_by_kind(child, "attribute_name") else {
            continue;
        };
        let name = node_text(name_node, source).to_ascii_lowercase();

        let value = if let Some(value_node) = find_child_by_kind(child, "quoted_attribute_value") {
            let raw = node_text(value_node, source);
            Some(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
        } else {
            find_child_by_kind(child, "attribute_value")
                .map(|value_node| node_text(value_node, source).to_string())
        };

        attributes.push((name, value));
    }

    attributes
}
