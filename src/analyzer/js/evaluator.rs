//! 実行しない静的評価器
//!
//! 構文ノードの種類ごとの有限の場合分けだけで値を求める。
//! 呼び出し・メンバーアクセス・演算子などは一切評価せず、
//! 元のソーステキストを持つ `Expression` になる。

use std::collections::HashMap;

use serde_json::{Number, Value};
use tree_sitter::Node;

use crate::model::{EvaluatedValue, ObjectMap};

/// 識別子の束縛環境（ラッパー関数の引数など）
pub type Env = HashMap<String, EvaluatedValue>;

/// 評価せずに `Expression` として扱うノード
const OPAQUE_EXPRESSION_KINDS: &[&str] = &[
    "call_expression",
    "member_expression",
    "subscript_expression",
    "binary_expression",
    "ternary_expression",
    "new_expression",
    "assignment_expression",
    "augmented_assignment_expression",
    "await_expression",
    "update_expression",
    "sequence_expression",
    "yield_expression",
    "this",
    "super",
];

pub struct Evaluator<'a> {
    source: &'a str,
    env: &'a Env,
}

impl<'a> Evaluator<'a> {
    pub fn new(source: &'a str, env: &'a Env) -> Self {
        Self { source, env }
    }

    pub fn evaluate(&self, node: Node) -> EvaluatedValue {
        match node.kind() {
            "string" => EvaluatedValue::string(self.string_value(node)),
            "number" => self.number_value(node),
            "true" => EvaluatedValue::Literal(Value::Bool(true)),
            "false" => EvaluatedValue::Literal(Value::Bool(false)),
            "null" | "undefined" => EvaluatedValue::null(),
            "identifier" => {
                let name = self.text(node);
                self.env
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| EvaluatedValue::Reference(name.to_string()))
            }
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => self.evaluate(inner),
                None => self.unknown(node),
            },
            "array" => EvaluatedValue::Array(
                named_children(node)
                    .into_iter()
                    .map(|element| match element.kind() {
                        "spread_element" => EvaluatedValue::Expression(self.text(element).to_string()),
                        _ => self.evaluate(element),
                    })
                    .collect(),
            ),
            "object" => EvaluatedValue::Object(self.object_value(node)),
            "unary_expression" => self.unary_value(node),
            "template_string" => self.template_value(node),
            "function_expression" | "function" | "arrow_function" | "generator_function" => {
                EvaluatedValue::FunctionLiteral(self.text(node).to_string())
            }
            kind if OPAQUE_EXPRESSION_KINDS.contains(&kind) => {
                EvaluatedValue::Expression(self.text(node).to_string())
            }
            _ => self.unknown(node),
        }
    }

    /// オブジェクトリテラルを評価する
    ///
    /// 静的に決まるキーのみを採用し、同じキーは後勝ち
    pub fn object_value(&self, node: Node) -> ObjectMap {
        let mut map = ObjectMap::new();

        for child in named_children(node) {
            match child.kind() {
                "pair" => {
                    let (Some(key), Some(value)) = (
                        child.child_by_field_name("key"),
                        child.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    if let Some(key) = self.property_key(key) {
                        map.insert(key, self.evaluate(value));
                    }
                }
                "shorthand_property_identifier" => {
                    let name = self.text(child).to_string();
                    let value = self
                        .env
                        .get(&name)
                        .cloned()
                        .unwrap_or_else(|| EvaluatedValue::Reference(name.clone()));
                    map.insert(name, value);
                }
                "method_definition" => {
                    if let Some(key) = child
                        .child_by_field_name("name")
                        .and_then(|name| self.property_key(name))
                    {
                        map.insert(key, EvaluatedValue::FunctionLiteral(self.text(child).to_string()));
                    }
                }
                // spread_element, comment など
                _ => {}
            }
        }

        map
    }

    /// プロパティキー（識別子・文字列・数値のみ。計算キーは None）
    fn property_key(&self, key: Node) -> Option<String> {
        match key.kind() {
            "property_identifier" | "identifier" => Some(self.text(key).to_string()),
            "string" => Some(self.string_value(key)),
            "number" => match self.number_value(key) {
                EvaluatedValue::Literal(Value::Number(n)) => Some(number_to_js_string(&n)),
                _ => Some(self.text(key).to_string()),
            },
            _ => None,
        }
    }

    fn unary_value(&self, node: Node) -> EvaluatedValue {
        let opaque = || EvaluatedValue::Expression(self.text(node).to_string());

        let (Some(operator), Some(argument)) = (
            node.child_by_field_name("operator"),
            node.child_by_field_name("argument"),
        ) else {
            return opaque();
        };

        let operand = match self.evaluate(argument) {
            EvaluatedValue::Literal(v @ (Value::Number(_) | Value::Bool(_))) => v,
            _ => return opaque(),
        };

        match self.text(operator) {
            "-" => number_literal(-to_number(&operand)),
            "+" => number_literal(to_number(&operand)),
            "!" => EvaluatedValue::Literal(Value::Bool(!is_truthy(&operand))),
            _ => opaque(),
        }
    }

    /// テンプレート文字列: 全ての埋め込み式がリテラルの場合のみ連結する
    fn template_value(&self, node: Node) -> EvaluatedValue {
        let mut units: Vec<u16> = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "string_fragment" => units.extend(self.text(child).encode_utf16()),
                "escape_sequence" => units.extend(decode_escape(self.text(child))),
                "template_substitution" => {
                    let text = named_children(child)
                        .into_iter()
                        .next()
                        .and_then(|expr| literal_to_template_text(&self.evaluate(expr)));
                    match text {
                        Some(text) => units.extend(text.encode_utf16()),
                        None => return EvaluatedValue::TemplateFragment(self.text(node).to_string()),
                    }
                }
                _ => {}
            }
        }

        EvaluatedValue::string(String::from_utf16_lossy(&units))
    }

    /// 文字列リテラルの値（エスケープを解釈し、クォートを除去）
    pub fn string_value(&self, node: Node) -> String {
        let mut units: Vec<u16> = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "string_fragment" => units.extend(self.text(child).encode_utf16()),
                "escape_sequence" => units.extend(decode_escape(self.text(child))),
                _ => {}
            }
        }

        String::from_utf16_lossy(&units)
    }

    fn number_value(&self, node: Node) -> EvaluatedValue {
        match parse_js_number(self.text(node)) {
            Some(n) if n.is_finite() => number_literal(n),
            _ => self.unknown(node),
        }
    }

    fn unknown(&self, node: Node) -> EvaluatedValue {
        EvaluatedValue::Unknown {
            kind: node.kind().to_string(),
            source: self.text(node).to_string(),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }
}

/// コメントを除いた名前付き子ノード
pub(super) fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn literal_to_template_text(value: &EvaluatedValue) -> Option<String> {
    match value {
        EvaluatedValue::Literal(Value::String(s)) => Some(s.clone()),
        EvaluatedValue::Literal(Value::Number(n)) => Some(number_to_js_string(n)),
        EvaluatedValue::Literal(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        _ => false,
    }
}

/// 整数値は i64、それ以外は f64 の JSON 数値にする
fn number_literal(n: f64) -> EvaluatedValue {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return EvaluatedValue::Literal(Value::Number(Number::from(n as i64)));
    }
    match Number::from_f64(n) {
        Some(num) => EvaluatedValue::Literal(Value::Number(num)),
        None => EvaluatedValue::Unknown {
            kind: "number".to_string(),
            source: n.to_string(),
        },
    }
}

fn number_to_js_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i128),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// JavaScriptの数値リテラルを解釈する（BigIntは None）
fn parse_js_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    if cleaned.ends_with('n') {
        return None;
    }
    let lower = cleaned.to_ascii_lowercase();

    let radix = |digits: &str, radix: u32| u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
    if let Some(hex) = lower.strip_prefix("0x") {
        return radix(hex, 16);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return radix(oct, 8);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return radix(bin, 2);
    }
    // 旧式の8進数 (017)
    if lower.len() > 1 && lower.starts_with('0') && lower.chars().all(|c| ('0'..='7').contains(&c)) {
        return radix(&lower[1..], 8);
    }
    lower.parse().ok()
}

/// エスケープシーケンスをUTF-16コード単位に変換する
fn decode_escape(seq: &str) -> Vec<u16> {
    let body = seq.strip_prefix('\\').unwrap_or(seq);
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return Vec::new();
    };
    let rest = chars.as_str();

    let unit = |c: char| {
        let mut buf = [0u16; 2];
        c.encode_utf16(&mut buf).to_vec()
    };

    match first {
        'n' => vec![0x0a],
        't' => vec![0x09],
        'r' => vec![0x0d],
        'b' => vec![0x08],
        'f' => vec![0x0c],
        'v' => vec![0x0b],
        '0' if rest.is_empty() => vec![0x00],
        // 行継続
        '\n' | '\r' | '\u{2028}' | '\u{2029}' => Vec::new(),
        'x' => u16::from_str_radix(rest, 16).map(|u| vec![u]).unwrap_or_else(|_| unit('x')),
        'u' => {
            let hex = rest.trim_start_matches('{').trim_end_matches('}');
            match u32::from_str_radix(hex, 16) {
                Ok(code) if code <= 0xffff => vec![code as u16],
                Ok(code) => char::from_u32(code).map(unit).unwrap_or_default(),
                Err(_) => unit('u'),
            }
        }
        c => {
            let mut units = unit(c);
            units.extend(rest.encode_utf16());
            units
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::parser::JsParser;
    use super::*;

    /// `(<expr>)` をパースして評価する
    fn eval_with(expr: &str, env: &Env) -> EvaluatedValue {
        let source = format!("x = {};", expr);
        let mut parser = JsParser::new();
        let tree = parser.parse_strict(&source).expect("valid expression");
        let value = find_assignment_value(tree.root_node()).expect("assignment value");
        Evaluator::new(&source, env).evaluate(value)
    }

    fn eval(expr: &str) -> EvaluatedValue {
        eval_with(expr, &Env::new())
    }

    fn find_assignment_value(node: Node) -> Option<Node> {
        if node.kind() == "assignment_expression" {
            return node.child_by_field_name("right");
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        children.into_iter().find_map(find_assignment_value)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("'a\\'b'"), EvaluatedValue::string("a'b"));
        assert_eq!(eval("\"tab\\there\""), EvaluatedValue::string("tab\there"));
        assert_eq!(eval("'\\u0041\\x42\\u{1F600}'"), EvaluatedValue::string("AB\u{1F600}"));
        assert_eq!(eval("42"), EvaluatedValue::Literal(json!(42)));
        assert_eq!(eval("1.5"), EvaluatedValue::Literal(json!(1.5)));
        assert_eq!(eval("0x1F"), EvaluatedValue::Literal(json!(31)));
        assert_eq!(eval("1_000"), EvaluatedValue::Literal(json!(1000)));
        assert_eq!(eval("true"), EvaluatedValue::Literal(json!(true)));
        assert_eq!(eval("null"), EvaluatedValue::null());
        assert_eq!(eval("undefined"), EvaluatedValue::null());
    }

    #[test]
    fn test_identifiers() {
        let mut env = Env::new();
        env.insert("label".to_string(), EvaluatedValue::string("group"));
        assert_eq!(eval_with("label", &env), EvaluatedValue::string("group"));
        assert_eq!(eval("other"), EvaluatedValue::Reference("other".to_string()));
    }

    #[test]
    fn test_object_keys_and_duplicates() {
        let value = eval("{a: 1, 'b': 2, 3: 'three', [computed]: 4, a: 5, ...rest, short, m() { return 1; }}");
        let map = value.as_object().expect("object");
        assert_eq!(map.get("a"), Some(&EvaluatedValue::Literal(json!(5))));
        assert_eq!(map.get("b"), Some(&EvaluatedValue::Literal(json!(2))));
        assert_eq!(map.get("3"), Some(&EvaluatedValue::string("three")));
        assert_eq!(map.get("short"), Some(&EvaluatedValue::Reference("short".to_string())));
        assert!(matches!(map.get("m"), Some(EvaluatedValue::FunctionLiteral(_))));
        assert_eq!(map.len(), 5);
        // 重複キーは最初の位置のまま値だけ後勝ち
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b", "3", "short", "m"]);
    }

    #[test]
    fn test_array_preserves_order() {
        assert_eq!(
            eval("['a', 1, foo()]"),
            EvaluatedValue::Array(vec![
                EvaluatedValue::string("a"),
                EvaluatedValue::Literal(json!(1)),
                EvaluatedValue::Expression("foo()".to_string()),
            ])
        );
    }

    #[test]
    fn test_opaque_expressions_keep_source() {
        assert_eq!(eval("RED._('label')"), EvaluatedValue::Expression("RED._('label')".to_string()));
        assert_eq!(eval("a.b"), EvaluatedValue::Expression("a.b".to_string()));
        assert_eq!(eval("1 + 2"), EvaluatedValue::Expression("1 + 2".to_string()));
        assert_eq!(eval("a || 'x'"), EvaluatedValue::Expression("a || 'x'".to_string()));
        assert_eq!(eval("c ? 1 : 2"), EvaluatedValue::Expression("c ? 1 : 2".to_string()));
        assert_eq!(eval("new Date()"), EvaluatedValue::Expression("new Date()".to_string()));
    }

    #[test]
    fn test_unary_folding() {
        assert_eq!(eval("-1"), EvaluatedValue::Literal(json!(-1)));
        assert_eq!(eval("+2.5"), EvaluatedValue::Literal(json!(2.5)));
        assert_eq!(eval("!true"), EvaluatedValue::Literal(json!(false)));
        assert_eq!(eval("!0"), EvaluatedValue::Literal(json!(true)));
        assert_eq!(eval("-true"), EvaluatedValue::Literal(json!(-1)));
        assert_eq!(eval("-x"), EvaluatedValue::Expression("-x".to_string()));
        assert_eq!(eval("!'s'"), EvaluatedValue::Expression("!'s'".to_string()));
        assert_eq!(eval("typeof 1"), EvaluatedValue::Expression("typeof 1".to_string()));
    }

    #[test]
    fn test_template_strings() {
        let mut env = Env::new();
        env.insert("n".to_string(), EvaluatedValue::Literal(json!(3)));
        assert_eq!(eval_with("`out ${n} ${'x'} ${true}`", &env), EvaluatedValue::string("out 3 x true"));
        assert_eq!(
            eval_with("`a ${n} ${other}`", &env),
            EvaluatedValue::TemplateFragment("`a ${n} ${other}`".to_string())
        );
        assert_eq!(eval("`plain`"), EvaluatedValue::string("plain"));
    }

    #[test]
    fn test_functions_and_unknowns() {
        assert!(matches!(eval("function() { return 1; }"), EvaluatedValue::FunctionLiteral(_)));
        assert_eq!(
            eval("(x) => x * 2"),
            EvaluatedValue::FunctionLiteral("(x) => x * 2".to_string())
        );
        assert!(matches!(
            eval("/ab+c/i"),
            EvaluatedValue::Unknown { ref kind, .. } if kind == "regex"
        ));
        assert_eq!(eval("('wrapped')"), EvaluatedValue::string("wrapped"));
    }

    #[test]
    fn test_bigint_is_unknown() {
        assert!(matches!(eval("10n"), EvaluatedValue::Unknown { .. }));
    }
}
