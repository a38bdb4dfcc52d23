use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{CatalogSnapshot, EvaluatedValue, NodeRecord};

pub const DEFAULT_SEARCH_LIMIT: usize = 25;
pub const MAX_SEARCH_LIMIT: usize = 200;
const SNIPPET_MAX_CHARS: usize = 400;
const LENGTH_PENALTY_CAP: usize = 10_000;

/// 一覧表示用の要約
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    #[serde(rename = "type")]
    pub node_type: String,
    pub category: Option<EvaluatedValue>,
    pub palette_label: Option<EvaluatedValue>,
    pub module: Option<String>,
    pub module_package: Option<String>,
    pub module_set: Option<String>,
    pub is_custom: bool,
    pub inputs: Option<EvaluatedValue>,
    pub outputs: Option<EvaluatedValue>,
}

impl From<&NodeRecord> for NodeSummary {
    fn from(node: &NodeRecord) -> Self {
        Self {
            node_type: node.node_type.clone(),
            category: node.category.clone(),
            palette_label: node.palette_label.clone(),
            module: node.module.clone(),
            module_package: node.module_package.clone(),
            module_set: node.module_set.clone(),
            is_custom: node.is_custom,
            inputs: node.inputs.clone(),
            outputs: node.outputs.clone(),
        }
    }
}

/// 検索条件
#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    pub query: String,
    pub custom_only: bool,
    pub module: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// 件数上限（未指定は25、1〜200に丸める）
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

/// 検索結果
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub node_type: String,
    pub category: Option<EvaluatedValue>,
    pub palette_label: Option<EvaluatedValue>,
    pub module: Option<String>,
    pub module_package: Option<String>,
    pub is_custom: bool,
    pub snippet: String,
}

impl CatalogSnapshot {
    /// 型名昇順の一覧
    pub fn list(&self, custom_only: bool) -> Vec<NodeSummary> {
        self.nodes
            .iter()
            .filter(|n| !custom_only || n.is_custom)
            .map(NodeSummary::from)
            .collect()
    }

    /// 部分文字列検索（一致位置が前で、対象テキストが短いほど上位）
    pub fn search(&self, query: &SearchQuery) -> Vec<SearchHit> {
        let needle = query.query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let module_filter = normalized_filter(query.module.as_deref());
        let category_filter = normalized_filter(query.category.as_deref());

        let mut scored: Vec<(f64, &NodeRecord)> = self
            .nodes
            .iter()
            .filter(|n| !query.custom_only || n.is_custom)
            .filter(|n| matches_filter(n.module.as_deref(), module_filter.as_deref()))
            .filter(|n| matches_filter(n.category_text().as_deref(), category_filter.as_deref()))
            .filter_map(|n| score(&haystack(n), &needle).map(|s| (s, n)))
            .collect();

        // 安定ソートなので同点は型名順のまま
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        scored.truncate(query.effective_limit());

        scored
            .into_iter()
            .map(|(_, node)| SearchHit {
                node_type: node.node_type.clone(),
                category: node.category.clone(),
                palette_label: node.palette_label.clone(),
                module: node.module.clone(),
                module_package: node.module_package.clone(),
                is_custom: node.is_custom,
                snippet: snippet(node),
            })
            .collect()
    }
}

fn normalized_filter(filter: Option<&str>) -> Option<String> {
    filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
}

/// フィルタ未指定なら常に一致、指定時は値がなければ不一致
fn matches_filter(value: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(filter) => value.is_some_and(|v| v.to_lowercase().contains(filter)),
    }
}

/// 検索対象テキスト（小文字化済み）
fn haystack(node: &NodeRecord) -> String {
    let default_names = node.defaults.keys().cloned().collect::<Vec<_>>().join(" ");

    [
        Some(node.node_type.clone()),
        node.category_text(),
        node.palette_label_text(),
        node.module.clone(),
        node.module_package.clone(),
        node.module_set.clone(),
        Some(node.help.text.clone()),
        Some(default_names),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// 一致位置（文字単位）+ 長さペナルティ。一致しなければ None
fn score(haystack: &str, needle: &str) -> Option<f64> {
    let byte_index = haystack.find(needle)?;
    let char_index = haystack[..byte_index].chars().count();
    let length = haystack.chars().count().min(LENGTH_PENALTY_CAP);
    Some(char_index as f64 + length as f64 / LENGTH_PENALTY_CAP as f64)
}

/// ヘルプ（なければテンプレート）のテキスト先頭400文字
fn snippet(node: &NodeRecord) -> String {
    let text = if node.help.text.is_empty() {
        &node.template.text
    } else {
        &node.help.text
    };
    text.chars().take(SNIPPET_MAX_CHARS).collect()
}
