use tree_sitter::{Node, Parser, Tree};

use crate::error::AnalyzerError;

pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("Failed to load JavaScript grammar");

        Self { parser }
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }

    /// 構文エラーを含むツリーはエラーとして扱う
    pub fn parse_strict(&mut self, source: &str) -> Result<Tree, AnalyzerError> {
        let tree = self
            .parse(source)
            .ok_or_else(|| AnalyzerError::Parse("parser returned no tree".to_string()))?;

        if tree.root_node().has_error() {
            let (line, column) = first_error_position(tree.root_node())
                .unwrap_or_else(|| {
                    let p = tree.root_node().start_position();
                    (p.row as u32 + 1, p.column as u32 + 1)
                });
            return Err(AnalyzerError::Syntax { line, column });
        }

        Ok(tree)
    }
}

impl Default for JsParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 最初の ERROR / MISSING ノードの位置（1始まり）
fn first_error_position(node: Node) -> Option<(u32, u32)> {
    if node.is_error() || node.is_missing() {
        let p = node.start_position();
        return Some((p.row as u32 + 1, p.column as u32 + 1));
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(pos) = first_error_position(child) {
            return Some(pos);
        }
    }
    None
}
