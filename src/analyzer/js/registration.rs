//! Pass 2: 登録呼び出しの解決

use tree_sitter::Node;

use super::context::{AnalyzerContext, Registration, ScriptAnalysis, SkippedCall};
use super::evaluator::{Env, Evaluator};
use super::RegistrationAnalyzer;
use crate::model::EvaluatedValue;

impl RegistrationAnalyzer {
    /// ツリー全体の call_expression を先行順に訪問し、登録を収集する
    pub(super) fn collect_registrations(
        &self,
        node: Node,
        source: &str,
        ctx: &AnalyzerContext,
        result: &mut ScriptAnalysis,
    ) {
        if node.kind() == "call_expression" {
            if self.is_registration_call(node, source) {
                if !ctx.is_wrapper_call(node) {
                    self.analyze_direct_call(node, source, result);
                }
            } else {
                self.analyze_wrapper_call(node, source, ctx, result);
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_registrations(child, source, ctx, result);
        }
    }

    /// 直接呼び出しを解析する
    ///
    /// 認識パターン:
    /// ```javascript
    /// RED.nodes.registerType('inject', { category: 'common', ... });
    /// ```
    /// 型名が文字列リテラルでない、またはオプションがオブジェクトリテラルでない場合はスキップ
    fn analyze_direct_call(&self, call: Node, source: &str, result: &mut ScriptAnalysis) {
        let Some((type_arg, options_arg)) = self.registration_args(call) else {
            self.skip(call, "registerType called with fewer than two arguments", result);
            return;
        };
        if type_arg.kind() != "string" {
            self.skip(call, "type name is not a string literal", result);
            return;
        }
        if options_arg.kind() != "object" {
            self.skip(call, "options are not an object literal", result);
            return;
        }

        let env = Env::new();
        let evaluator = Evaluator::new(source, &env);
        let node_type = evaluator.string_value(type_arg);
        if node_type.is_empty() {
            self.skip(call, "type name is empty", result);
            return;
        }

        result.registrations.push(Registration {
            node_type,
            options: evaluator.object_value(options_arg),
            options_source: source[options_arg.byte_range()].to_string(),
        });
    }

    /// ラッパー関数経由の呼び出しを解析する
    ///
    /// 認識パターン:
    /// ```javascript
    /// function reg(type, label) { RED.nodes.registerType(type, { category: label }); }
    /// reg('bar', 'group');
    /// ```
    fn analyze_wrapper_call(
        &self,
        call: Node,
        source: &str,
        ctx: &AnalyzerContext,
        result: &mut ScriptAnalysis,
    ) {
        let Some(callee) = call.child_by_field_name("function") else {
            return;
        };
        if callee.kind() != "identifier" {
            return;
        }
        let Some(wrapper) = ctx.get_wrapper(&source[callee.byte_range()]) else {
            return;
        };

        // 呼び出し側の引数は空の環境で評価し、パラメータに位置で束縛する
        let empty = Env::new();
        let arg_evaluator = Evaluator::new(source, &empty);
        let args = self.call_arguments(call);
        let env: Env = wrapper
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let value = args
                    .get(i)
                    .map(|arg| arg_evaluator.evaluate(*arg))
                    .unwrap_or_else(EvaluatedValue::null);
                (param.clone(), value)
            })
            .collect();

        let node_type = match env.get(&wrapper.type_param).and_then(EvaluatedValue::as_str) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                self.skip(call, "wrapper type argument does not resolve to a string", result);
                return;
            }
        };

        let evaluator = Evaluator::new(source, &env);
        result.registrations.push(Registration {
            node_type,
            options: evaluator.object_value(wrapper.options),
            options_source: source[wrapper.options.byte_range()].to_string(),
        });
    }

    fn skip(&self, call: Node, reason: &str, result: &mut ScriptAnalysis) {
        let line = call.start_position().row as u32 + 1;
        tracing::debug!("Skipping registration call at line {}: {}", line, reason);
        result.skipped.push(SkippedCall {
            line,
            reason: reason.to_string(),
        });
    }
}
