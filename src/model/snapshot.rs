use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::node::NodeRecord;

/// ある時点で構築されたカタログ（不変）
///
/// リフレッシュごとに丸ごと置き換えられ、部分的に更新されることはない
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    created: Instant,
    /// 型名昇順
    pub nodes: Vec<NodeRecord>,
    #[serde(skip)]
    by_type: HashMap<String, usize>,
    pub warnings: Vec<String>,
    pub source: String,
}

impl CatalogSnapshot {
    /// 型名昇順のレコード列からスナップショットを作成
    pub fn new(nodes: Vec<NodeRecord>, warnings: Vec<String>, source: impl Into<String>) -> Self {
        let by_type = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.node_type.clone(), i))
            .collect();
        Self {
            fetched_at: Utc::now(),
            created: Instant::now(),
            nodes,
            by_type,
            warnings,
            source: source.into(),
        }
    }

    pub fn get(&self, node_type: &str) -> Option<&NodeRecord> {
        self.by_type.get(node_type).map(|&i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }

    /// しきい値を超えて古くなったか（しきい値0は常に古い）
    pub fn is_stale(&self, threshold: Duration) -> bool {
        threshold.is_zero() || self.age() > threshold
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.node_type.as_str())
    }
}
