use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// オブジェクトリテラルの評価結果（ソース上の宣言順を保つ）
pub type ObjectMap = IndexMap<String, EvaluatedValue>;

/// 静的評価の結果
///
/// スクリプトは決して実行しない。静的に値が決まらないものは
/// 元のソーステキストを保持したプレースホルダーになる。
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluatedValue {
    /// null / bool / number / string
    Literal(Value),
    Array(Vec<EvaluatedValue>),
    Object(ObjectMap),
    /// 環境に束縛されていない識別子
    Reference(String),
    /// 呼び出し・メンバーアクセス・演算など、評価しない式
    Expression(String),
    /// 静的に連結できなかったテンプレート文字列
    TemplateFragment(String),
    FunctionLiteral(String),
    Unknown { kind: String, source: String },
}

impl EvaluatedValue {
    pub fn null() -> Self {
        Self::Literal(Value::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Value::String(s.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Literal(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// 文字列・数値・真偽値リテラルをテキスト化する（検索・フィルタ用）
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Literal(Value::String(s)) => Some(s.clone()),
            Self::Literal(Value::Number(n)) => Some(n.to_string()),
            Self::Literal(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 明示的な値を持たないか（マージ時に既存値を消さない）
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Literal(Value::Null) => true,
            Self::Literal(Value::String(s)) => s.is_empty(),
            Self::Array(items) => items.is_empty(),
            Self::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// プレースホルダーの種類名
    fn placeholder_kind(&self) -> Option<&'static str> {
        match self {
            Self::Reference(_) => Some("reference"),
            Self::Expression(_) => Some("expression"),
            Self::TemplateFragment(_) => Some("template"),
            Self::FunctionLiteral(_) => Some("function"),
            Self::Unknown { .. } => Some("unknown"),
            _ => None,
        }
    }

    /// JSON値に変換（プレースホルダーは `{"$kind": ...}` オブジェクトになる）
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for EvaluatedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize(serializer),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Object(map) => serializer.collect_map(map),
            Self::Reference(name) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$kind", "reference")?;
                map.serialize_entry("name", name)?;
                map.end()
            }
            Self::Unknown { kind, source } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("$kind", "unknown")?;
                map.serialize_entry("nodeKind", kind)?;
                map.serialize_entry("source", source)?;
                map.end()
            }
            Self::Expression(source)
            | Self::TemplateFragment(source)
            | Self::FunctionLiteral(source) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$kind", &self.placeholder_kind())?;
                map.serialize_entry("source", source)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_literals_serialize_as_plain_json() {
        let mut map = ObjectMap::new();
        map.insert("name".to_string(), EvaluatedValue::string("x"));
        map.insert(
            "list".to_string(),
            EvaluatedValue::Array(vec![EvaluatedValue::Literal(json!(1)), EvaluatedValue::null()]),
        );
        let value = EvaluatedValue::Object(map);
        assert_eq!(value.to_json(), json!({"list": [1, null], "name": "x"}));
    }

    #[test]
    fn test_placeholders_are_tagged() {
        assert_eq!(
            EvaluatedValue::Expression("foo()".to_string()).to_json(),
            json!({"$kind": "expression", "source": "foo()"})
        );
        assert_eq!(
            EvaluatedValue::Reference("label".to_string()).to_json(),
            json!({"$kind": "reference", "name": "label"})
        );
        assert_eq!(
            EvaluatedValue::Unknown { kind: "regex".to_string(), source: "/a/".to_string() }.to_json(),
            json!({"$kind": "unknown", "nodeKind": "regex", "source": "/a/"})
        );
    }

    #[test]
    fn test_emptiness() {
        assert!(EvaluatedValue::null().is_empty());
        assert!(EvaluatedValue::string("").is_empty());
        assert!(EvaluatedValue::Object(ObjectMap::new()).is_empty());
        assert!(!EvaluatedValue::Literal(json!(0)).is_empty());
        assert!(!EvaluatedValue::Literal(json!(false)).is_empty());
        assert!(!EvaluatedValue::FunctionLiteral("function(){}".to_string()).is_empty());
    }
}
