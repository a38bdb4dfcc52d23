//! 編集テンプレートのフォーム項目抽出

use tree_sitter::Node;

use crate::model::TemplateFields;

use super::super::HtmlParser;
use super::tag_attributes;

const OWN_FIELD_PREFIX: &str = "node-input-";
const NESTED_FIELD_PREFIX: &str = "node-config-input-";

/// テンプレートHTMLから `id="node-input-*"` / `id="node-config-input-*"` を集める
pub fn extract_template_fields(html: &str) -> TemplateFields {
    let mut fields = TemplateFields::default();
    if html.trim().is_empty() {
        return fields;
    }

    let mut parser = HtmlParser::new();
    if let Some(tree) = parser.parse(html) {
        collect_fields_from_node(tree.root_node(), html, &mut fields);
    }

    fields
}

fn collect_fields_from_node(node: Node, source: &str, fields: &mut TemplateFields) {
    if matches!(node.kind(), "start_tag" | "self_closing_tag") {
        for (name, value) in tag_attributes(node, source) {
            if let ("id", Some(id)) = (name.as_str(), value) {
                add_field(fields, id.trim());
            }
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_fields_from_node(child, source, fields);
    }
}

fn add_field(fields: &mut TemplateFields, id: &str) {
    let (target, name) = if let Some(name) = id.strip_prefix(NESTED_FIELD_PREFIX) {
        (&mut fields.nested, name)
    } else if let Some(name) = id.strip_prefix(OWN_FIELD_PREFIX) {
        (&mut fields.own, name)
    } else {
        return;
    };

    if name.is_empty() {
        return;
    }
    if !target.iter().any(|f| f == name) {
        target.push(name.to_string());
    }
    if !fields.all.iter().any(|f| f == name) {
        fields.all.push(name.to_string());
    }
}
