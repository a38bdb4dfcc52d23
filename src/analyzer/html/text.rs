//! HTML断片からプレーンテキストを取り出す

use phf::phf_set;
use tree_sitter::Node;

use super::super::HtmlParser;
use super::{find_child_by_kind, node_text};

/// 前後で単語が区切られる要素
static BLOCK_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
};

/// HTMLをプレーンテキストに変換する
///
/// テキストノードと文字参照を連結し、空白を1つに畳む。
/// インライン要素（`<code>` など）の境界では区切らない。
/// script/style の中身は含めない。壊れたマークアップでも失敗しない。
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let mut parser = HtmlParser::new();
    let Some(tree) = parser.parse(html) else {
        return String::new();
    };

    let mut collector = TextCollector::new(html);
    collector.visit(tree.root_node());
    collapse_whitespace(&collector.out)
}

struct TextCollector<'a> {
    source: &'a str,
    out: String,
    last_end: usize,
    /// 直前にブロック要素の境界を通過した
    pending_break: bool,
}

impl<'a> TextCollector<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            out: String::new(),
            last_end: 0,
            pending_break: false,
        }
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "text" => {
                let text = node_text(node, self.source);
                self.push(node.start_byte(), node.end_byte(), text);
                return;
            }
            "entity" => {
                let decoded = html_escape::decode_html_entities(node_text(node, self.source));
                self.push(node.start_byte(), node.end_byte(), &decoded);
                return;
            }
            "script_element" | "style_element" | "comment" => return,
            "element" if is_block_element(node, self.source) => {
                self.pending_break = true;
                self.visit_children(node);
                self.pending_break = true;
                return;
            }
            _ => {}
        }

        self.visit_children(node);
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn push(&mut self, start: usize, end: usize, text: &str) {
        if !self.out.is_empty() && (self.pending_break || self.whitespace_between(start)) {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.last_end = end;
        self.pending_break = false;
    }

    /// 直前のテキストの直後、または次のテキストの直前がソース上で空白か
    ///
    /// tree-sitter の text ノードは前後の空白を含まない
    fn whitespace_between(&self, start: usize) -> bool {
        let after_previous = self.source[self.last_end..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        let before_next = self.source[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        after_previous || before_next
    }
}

fn is_block_element(element: Node, source: &str) -> bool {
    find_child_by_kind(element, "start_tag")
        .or_else(|| find_child_by_kind(element, "self_closing_tag"))
        .and_then(|tag| find_child_by_kind(tag, "tag_name"))
        .is_some_and(|name| BLOCK_ELEMENTS.contains(node_text(name, source).to_ascii_lowercase().as_str()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
