use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::source::{HtmlSource, HttpHtmlSource};
use crate::config::{CatalogConfig, ModuleMatcher};
use crate::error::CatalogError;
use crate::index::{build_catalog, NodeSummary, SearchHit, SearchQuery};
use crate::model::{CatalogSnapshot, NodeRecord};

/// 鮮度しきい値付きでカタログのスナップショットを保持するキャッシュ
///
/// スナップショットは不変で、リフレッシュ時に `Arc` ごと差し替える。
/// 読み取り側は差し替え前後どちらかの完全なスナップショットだけを見る。
pub struct CatalogCache {
    source: Arc<dyn HtmlSource>,
    freshness: Duration,
    matcher: ModuleMatcher,
    verbose_warnings: bool,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn HtmlSource>, config: &CatalogConfig) -> Self {
        Self {
            source,
            freshness: config.freshness(),
            matcher: config.create_module_matcher(),
            verbose_warnings: config.verbose_warnings,
            current: RwLock::new(None),
        }
    }

    /// 設定からHTTP取得元付きのキャッシュを作成
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let source = HttpHtmlSource::new(config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    /// 現在のスナップショット（リフレッシュはしない）
    pub async fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current.read().await.clone()
    }

    /// HTMLを取得してカタログを再構築し、新しいスナップショットとして公開する
    ///
    /// 失敗時は以前のスナップショットをそのまま残す
    pub async fn refresh(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let html = self.source.fetch_html().await?;

        let verbose = self.verbose_warnings;
        let (mut nodes, warnings) = tokio::task::spawn_blocking(move || build_catalog(&html, verbose))
            .await
            .map_err(|e| CatalogError::Build(e.to_string()))?;

        for node in &mut nodes {
            node.is_custom = self
                .matcher
                .is_custom(node.module.as_deref(), node.module_package.as_deref());
        }

        let snapshot = Arc::new(CatalogSnapshot::new(nodes, warnings, self.source.describe()));
        info!(
            "Node catalog refreshed: {} nodes, {} warnings",
            snapshot.len(),
            snapshot.warnings.len()
        );

        *self.current.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// スナップショットを取得する
    ///
    /// 未取得・空・強制指定・しきい値超過のいずれかならリフレッシュする
    ///
    /// 強制でない読み取りでリフレッシュに失敗した場合は、直前の
    /// スナップショットがあればそれを返す
    pub async fn get_catalog(&self, force: bool) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        if force {
            return self.refresh().await;
        }

        let previous = self.current().await;
        if let Some(snapshot) = &previous {
            if !snapshot.is_empty() && !snapshot.is_stale(self.freshness) {
                return Ok(Arc::clone(snapshot));
            }
            debug!("Node catalog snapshot is stale or empty (age {:?})", snapshot.age());
        }

        match (self.refresh().await, previous) {
            (Ok(snapshot), _) => Ok(snapshot),
            (Err(e), Some(stale)) if !stale.is_empty() => {
                warn!("Node catalog refresh failed, serving previous snapshot: {}", e);
                Ok(stale)
            }
            (Err(e), _) => Err(e),
        }
    }

    pub async fn list(&self, custom_only: bool) -> Result<Vec<NodeSummary>, CatalogError> {
        Ok(self.get_catalog(false).await?.list(custom_only))
    }

    pub async fn get_node(&self, node_type: &str) -> Result<Option<NodeRecord>, CatalogError> {
        Ok(self.get_catalog(false).await?.get(node_type).cloned())
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, CatalogError> {
        if query.query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.get_catalog(false).await?.search(query))
    }
}
