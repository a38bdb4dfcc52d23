use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::analyzer::html::{
    extract_module_content, extract_template_fields, html_to_text, split_modules, TypedFragment,
};
use crate::analyzer::js::{Registration, RegistrationAnalyzer};
use crate::model::{EvaluatedValue, HtmlText, ModuleName, NodeRecord};

/// モジュールごとの部分情報を1型1レコードにまとめるビルダー
///
/// 各フィールドは「明示的な値の後勝ち」でマージする。
/// 空の値で既存の値が消えることはない。
pub struct CatalogBuilder {
    analyzer: RegistrationAnalyzer,
    verbose_warnings: bool,
    records: BTreeMap<String, NodeRecord>,
    warnings: Vec<String>,
}

impl CatalogBuilder {
    pub fn new(verbose_warnings: bool) -> Self {
        Self {
            analyzer: RegistrationAnalyzer::new(),
            verbose_warnings,
            records: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// エディタHTML全体を取り込む（モジュールは文書順）
    pub fn add_document(&mut self, html: &str) -> &mut Self {
        for block in split_modules(html) {
            self.add_module(&block.name, block.html);
        }
        self
    }

    /// 1モジュール分の断片を取り込む
    ///
    /// help/template を先に、登録呼び出しを後にマージする
    pub fn add_module(&mut self, module: &ModuleName, html: &str) -> &mut Self {
        let content = extract_module_content(html);
        debug!(
            "Module {}: {} help, {} templates, {} scripts",
            module.name,
            content.help.len(),
            content.templates.len(),
            content.scripts.len()
        );

        for fragment in &content.help {
            self.merge_help(module, fragment);
        }
        for fragment in &content.templates {
            self.merge_template(module, fragment);
        }

        for script in &content.scripts {
            match self.analyzer.analyze(script) {
                Ok(analysis) => {
                    for registration in &analysis.registrations {
                        self.merge_registration(module, registration);
                    }
                    if self.verbose_warnings {
                        for skipped in &analysis.skipped {
                            self.warnings.push(format!(
                                "{}: skipped registerType call at line {}: {}",
                                module.name, skipped.line, skipped.reason
                            ));
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to parse registration script in {}: {}", module.name, e);
                    self.warnings.push(format!(
                        "{}: failed to parse registration script: {}",
                        module.name, e
                    ));
                }
            }
        }

        self
    }

    pub fn merge_help(&mut self, module: &ModuleName, fragment: &TypedFragment) {
        let record = self.record_for(module, &fragment.node_type);
        let help = html_text(&fragment.html);
        if !help.is_empty() {
            record.help = help;
        }
    }

    pub fn merge_template(&mut self, module: &ModuleName, fragment: &TypedFragment) {
        let record = self.record_for(module, &fragment.node_type);
        let template = html_text(&fragment.html);
        if template.is_empty() {
            return;
        }

        let fields = extract_template_fields(&template.html);
        if !fields.is_empty() {
            record.template_fields = fields;
        }
        record.template = template;
    }

    pub fn merge_registration(&mut self, module: &ModuleName, registration: &Registration) {
        let record = self.record_for(module, &registration.node_type);
        let options = &registration.options;

        merge_value(&mut record.category, options.get("category"));
        merge_value(&mut record.palette_label, options.get("paletteLabel"));
        merge_value(&mut record.color, options.get("color"));
        merge_value(&mut record.icon, options.get("icon"));
        merge_value(&mut record.align, options.get("align"));
        merge_value(&mut record.inputs, options.get("inputs"));
        merge_value(&mut record.outputs, options.get("outputs"));
        merge_value(&mut record.output_labels, options.get("outputLabels"));

        if let Some(defaults) = options.get("defaults").and_then(EvaluatedValue::as_object) {
            if !defaults.is_empty() {
                record.defaults = defaults.clone();
            }
        }
        if !options.is_empty() {
            record.options = options.clone();
        }
        if !registration.options_source.trim().is_empty() {
            record.options_source = Some(registration.options_source.clone());
        }
    }

    /// 型のレコードを取得（なければ作成）し、モジュール帰属を上書きする
    fn record_for(&mut self, module: &ModuleName, node_type: &str) -> &mut NodeRecord {
        let record = self
            .records
            .entry(node_type.to_string())
            .or_insert_with(|| NodeRecord::new(node_type));
        record.set_module(module);
        record
    }

    /// 型名昇順のレコード列と警告を返す
    pub fn finish(self) -> (Vec<NodeRecord>, Vec<String>) {
        (self.records.into_values().collect(), self.warnings)
    }
}

fn html_text(html: &str) -> HtmlText {
    let html = html.trim();
    HtmlText {
        html: html.to_string(),
        text: html_to_text(html),
    }
}

/// 明示的な値のみで上書きする
fn merge_value(slot: &mut Option<EvaluatedValue>, value: Option<&EvaluatedValue>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value.clone());
    }
}

/// エディタHTMLからカタログを構築する
pub fn build_catalog(html: &str, verbose_warnings: bool) -> (Vec<NodeRecord>, Vec<String>) {
    let mut builder = CatalogBuilder::new(verbose_warnings);
    builder.add_document(html);
    builder.finish()
}
