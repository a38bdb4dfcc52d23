use serde_json::json;

use crate::error::AnalyzerError;
use crate::model::EvaluatedValue;

use super::{Registration, RegistrationAnalyzer, ScriptAnalysis};

fn analyze(source: &str) -> ScriptAnalysis {
    RegistrationAnalyzer::new()
        .analyze(source)
        .expect("script should parse")
}

/// ヘルパー: 指定型の登録を取得
fn registration<'a>(result: &'a ScriptAnalysis, node_type: &str) -> &'a Registration {
    result
        .registrations
        .iter()
        .find(|r| r.node_type == node_type)
        .unwrap_or_else(|| panic!("registration for {node_type} should exist"))
}

// ==========================================================================
// 直接呼び出し
// ==========================================================================

#[test]
fn test_direct_registration() {
    let result = analyze(
        r#"
RED.nodes.registerType('foo', {
    category: 'x',
    color: '#a6bbcf',
    defaults: { name: { value: "" }, topic: { value: "", required: true } },
    inputs: 1,
    outputs: 2,
    icon: "file.svg",
    label: function() { return this.name || "foo"; }
});
"#,
    );

    assert_eq!(result.registrations.len(), 1);
    let reg = registration(&result, "foo");
    assert_eq!(reg.options.get("category"), Some(&EvaluatedValue::string("x")));
    assert_eq!(reg.options.get("outputs"), Some(&EvaluatedValue::Literal(json!(2))));
    assert!(matches!(reg.options.get("label"), Some(EvaluatedValue::FunctionLiteral(_))));
    assert!(reg.options_source.starts_with('{'));
    assert!(reg.options_source.contains("category: 'x'"));

    let defaults = reg.options.get("defaults").and_then(EvaluatedValue::as_object).unwrap();
    assert_eq!(
        defaults.get("topic").map(EvaluatedValue::to_json),
        Some(json!({"value": "", "required": true}))
    );
}

#[test]
fn test_registration_inside_iife() {
    let result = analyze(
        r#"
(function() {
    var count = 0;
    RED.nodes.registerType("inside", { category: "function", outputs: count });
})();
"#,
    );

    let reg = registration(&result, "inside");
    assert_eq!(reg.options.get("outputs"), Some(&EvaluatedValue::Reference("count".to_string())));
}

#[test]
fn test_multiple_registrations_in_order() {
    let result = analyze(
        r#"
RED.nodes.registerType('b-node', { category: 'one' });
RED.nodes.registerType('a-node', { category: 'two' });
RED.nodes.registerType('b-node', { category: 'three' });
"#,
    );

    let types: Vec<&str> = result.registrations.iter().map(|r| r.node_type.as_str()).collect();
    assert_eq!(types, vec!["b-node", "a-node", "b-node"]);
}

#[test]
fn test_non_literal_arguments_are_skipped() {
    let result = analyze(
        r#"
var name = 'dyn';
var opts = { category: 'x' };
RED.nodes.registerType(name, { category: 'x' });
RED.nodes.registerType('static', opts);
RED.nodes.registerType('lonely');
"#,
    );

    assert!(result.registrations.is_empty());
    assert_eq!(result.skipped.len(), 3);
    assert_eq!(result.skipped[0].line, 4);
}

#[test]
fn test_other_receivers_are_ignored() {
    let result = analyze(
        r#"
FOO.nodes.registerType('a', {});
RED.registerType('b', {});
RED.nodes.register('c', {});
nodes.registerType('d', {});
"#,
    );

    assert!(result.registrations.is_empty());
    assert!(result.skipped.is_empty());
}

#[test]
fn test_dynamic_values_become_placeholders() {
    let result = analyze(
        r#"
RED.nodes.registerType('dyn', {
    category: RED._("node-red:common.label.common"),
    paletteLabel: `Dyn ${suffix}`,
    color: '#' + 'fff',
    align: 'right'
});
"#,
    );

    let reg = registration(&result, "dyn");
    assert_eq!(
        reg.options.get("category"),
        Some(&EvaluatedValue::Expression("RED._(\"node-red:common.label.common\")".to_string()))
    );
    assert_eq!(
        reg.options.get("paletteLabel"),
        Some(&EvaluatedValue::TemplateFragment("`Dyn ${suffix}`".to_string()))
    );
    assert_eq!(
        reg.options.get("color"),
        Some(&EvaluatedValue::Expression("'#' + 'fff'".to_string()))
    );
    assert_eq!(reg.options.get("align"), Some(&EvaluatedValue::string("right")));
}

// ==========================================================================
// ラッパー関数経由
// ==========================================================================

#[test]
fn test_wrapper_function_declaration() {
    let result = analyze(
        r#"
function reg(type, label) {
    RED.nodes.registerType(type, { category: label, paletteLabel: type });
}
reg("bar", "group");
reg("baz");
"#,
    );

    assert_eq!(result.registrations.len(), 2);
    let bar = registration(&result, "bar");
    assert_eq!(bar.options.get("category"), Some(&EvaluatedValue::string("group")));
    assert_eq!(bar.options.get("paletteLabel"), Some(&EvaluatedValue::string("bar")));
    assert_eq!(bar.options_source, "{ category: label, paletteLabel: type }");

    // 引数不足のパラメータは null に束縛される
    let baz = registration(&result, "baz");
    assert_eq!(baz.options.get("category"), Some(&EvaluatedValue::null()));
    // ラッパー本体内の呼び出しはスキップ扱いにならない
    assert!(result.skipped.is_empty());
}

#[test]
fn test_wrapper_variable_declarations() {
    let result = analyze(
        r#"
var viaFunction = function(kind, color) {
    RED.nodes.registerType(kind, { color: color, category: 'vars' });
};
const viaArrow = (kind) => {
    RED.nodes.registerType(kind, { category: 'arrow' });
};
const single = kind => {
    RED.nodes.registerType(kind, { category: 'single' });
};
viaFunction('f-node', '#fff');
viaArrow('a-node');
single('s-node');
"#,
    );

    assert_eq!(
        registration(&result, "f-node").options.get("color"),
        Some(&EvaluatedValue::string("#fff"))
    );
    assert_eq!(
        registration(&result, "a-node").options.get("category"),
        Some(&EvaluatedValue::string("arrow"))
    );
    assert_eq!(
        registration(&result, "s-node").options.get("category"),
        Some(&EvaluatedValue::string("single"))
    );
}

#[test]
fn test_wrapper_with_non_string_type_argument_is_skipped() {
    let result = analyze(
        r#"
function reg(type) { RED.nodes.registerType(type, { category: 'x' }); }
var t = 'later';
reg(t);
reg(42);
reg('');
"#,
    );

    assert!(result.registrations.is_empty());
    assert_eq!(result.skipped.len(), 3);
}

#[test]
fn test_non_qualifying_wrappers() {
    let result = analyze(
        r#"
// 型名がパラメータでない
function fixed(label) { RED.nodes.registerType('fixed-type', { category: label }); }
// オプションがオブジェクトリテラルでない
function withOpts(type, opts) { RED.nodes.registerType(type, opts); }
// 分割代入パラメータ
function destructured({ type }) { RED.nodes.registerType(type, {}); }
// 式本体のアロー関数
const expr = (type) => RED.nodes.registerType(type, {});
fixed('ignored');
withOpts('w', {});
destructured({ type: 'd' });
expr('e');
"#,
    );

    // fixed 本体内の直接呼び出しのみが登録になる
    let types: Vec<&str> = result.registrations.iter().map(|r| r.node_type.as_str()).collect();
    assert_eq!(types, vec!["fixed-type"]);
    assert_eq!(
        registration(&result, "fixed-type").options.get("category"),
        Some(&EvaluatedValue::Reference("label".to_string()))
    );
}

#[test]
fn test_wrapper_first_registration_call_wins() {
    let result = analyze(
        r#"
function reg(type) {
    RED.nodes.registerType(type, { category: 'first' });
    RED.nodes.registerType(type, { category: 'second' });
}
reg('only');
"#,
    );

    let regs: Vec<_> = result.registrations.iter().filter(|r| r.node_type == "only").collect();
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0].options.get("category"), Some(&EvaluatedValue::string("first")));
    // 2つ目の呼び出しは型名がリテラルでないためスキップ
    assert_eq!(result.skipped.len(), 1);
}

#[test]
fn test_wrapper_arguments_are_evaluated_statically() {
    let result = analyze(
        r#"
function reg(type, outputs) { RED.nodes.registerType(type, { outputs: outputs }); }
reg('calc', compute());
"#,
    );

    assert_eq!(
        registration(&result, "calc").options.get("outputs"),
        Some(&EvaluatedValue::Expression("compute()".to_string()))
    );
}

// ==========================================================================
// 構文エラー
// ==========================================================================

#[test]
fn test_syntax_error_yields_no_registrations() {
    let err = RegistrationAnalyzer::new()
        .analyze("RED.nodes.registerType('broken', { category: 'x' ")
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Syntax { line: 1, .. }));
}
