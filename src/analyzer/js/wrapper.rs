//! Pass 1: 登録ラッパー関数の収集

use tree_sitter::Node;

use super::context::{AnalyzerContext, WrapperBinding};
use super::evaluator::named_children;
use super::RegistrationAnalyzer;

impl RegistrationAnalyzer {
    /// ラッパー関数を収集する
    ///
    /// 認識パターン:
    /// ```javascript
    /// function reg(type, label) {
    ///     RED.nodes.registerType(type, { category: label });
    /// }
    /// var reg2 = function(type) { RED.nodes.registerType(type, {...}); };
    /// const reg3 = (type) => { RED.nodes.registerType(type, {...}); };
    /// ```
    pub(super) fn collect_wrappers<'tree>(
        &self,
        node: Node<'tree>,
        source: &str,
        ctx: &mut AnalyzerContext<'tree>,
    ) {
        match node.kind() {
            "function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.try_register_wrapper(&source[name.byte_range()], node, source, ctx);
                }
            }
            "variable_declarator" => {
                if let (Some(name), Some(value)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("value"),
                ) {
                    if name.kind() == "identifier"
                        && matches!(value.kind(), "function_expression" | "function" | "arrow_function")
                    {
                        self.try_register_wrapper(&source[name.byte_range()], value, source, ctx);
                    }
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_wrappers(child, source, ctx);
        }
    }

    fn try_register_wrapper<'tree>(
        &self,
        name: &str,
        func: Node<'tree>,
        source: &str,
        ctx: &mut AnalyzerContext<'tree>,
    ) {
        let Some(body) = func.child_by_field_name("body") else {
            return;
        };
        if body.kind() != "statement_block" {
            return;
        }
        let Some(params) = self.flat_params(func, source) else {
            return;
        };

        // 本体を先行順に探索し、最初に見つかった登録呼び出しのみを判定する
        let Some(call) = self.find_registration_call(body, source) else {
            return;
        };
        let Some((type_arg, options_arg)) = self.registration_args(call) else {
            return;
        };

        if type_arg.kind() != "identifier" || options_arg.kind() != "object" {
            return;
        }
        let type_param = &source[type_arg.byte_range()];
        if !params.iter().any(|p| p == type_param) {
            return;
        }

        tracing::debug!("Found registration wrapper: {}({})", name, params.join(", "));
        ctx.add_wrapper(
            name.to_string(),
            call,
            WrapperBinding {
                type_param: type_param.to_string(),
                params,
                options: options_arg,
            },
        );
    }

    /// パラメータが単純な識別子の並びの場合のみ名前のリストを返す
    ///
    /// - function(a, b) {}
    /// - (a, b) => {}
    /// - a => {}
    fn flat_params(&self, func: Node, source: &str) -> Option<Vec<String>> {
        if let Some(single) = func.child_by_field_name("parameter") {
            return (single.kind() == "identifier").then(|| vec![source[single.byte_range()].to_string()]);
        }

        let params_node = func.child_by_field_name("parameters")?;
        let mut params = Vec::new();
        for child in named_children(params_node) {
            if child.kind() != "identifier" {
                return None;
            }
            params.push(source[child.byte_range()].to_string());
        }
        Some(params)
    }

    /// 部分木から最初の `RED.nodes.registerType(...)` 呼び出しを探す
    fn find_registration_call<'tree>(&self, node: Node<'tree>, source: &str) -> Option<Node<'tree>> {
        if node.kind() == "call_expression" && self.is_registration_call(node, source) {
            return Some(node);
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'tree>> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| self.find_registration_call(child, source))
    }
}
