use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::module_matcher::ModuleMatcher;
use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "nodecatalog.json";

/// nodecatalog.json の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    /// 管理画面のベースURL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// httpAdminRoot 相当のパスプレフィックス（例: "/admin"）
    #[serde(default)]
    pub admin_prefix: String,
    /// Bearerトークン（未設定なら認証ヘッダーを付与しない）
    #[serde(default)]
    pub token: Option<String>,
    /// スナップショットの鮮度しきい値（ミリ秒、0なら常に再取得）
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// カスタムノードとして扱うモジュールの許可リスト
    #[serde(default = "default_custom_modules")]
    pub custom_modules: Vec<String>,
    /// スキップした登録呼び出しも警告として記録する
    #[serde(default)]
    pub verbose_warnings: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:1880".to_string()
}

fn default_cache_ttl_ms() -> u64 {
    60_000
}

fn default_custom_modules() -> Vec<String> {
    vec![
        "node-red-contrib-local".to_string(),
        "@local/node-red-nodes".to_string(),
    ]
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            admin_prefix: String::new(),
            token: None,
            cache_ttl_ms: default_cache_ttl_ms(),
            custom_modules: default_custom_modules(),
            verbose_warnings: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    /// 指定ディレクトリからnodecatalog.jsonを読み込む
    pub fn load_from_dir(dir: &Path) -> Self {
        Self::load_from_path(&dir.join(CONFIG_FILE_NAME))
    }

    /// 指定パスからnodecatalog.jsonを読み込む
    ///
    /// ファイルが存在しない・壊れている場合はデフォルト設定を返す
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// 指定パスから読み込み、失敗時はエラーを返す
    pub fn try_load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 環境変数による上書きを適用
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("NODE_CATALOG_URL") {
            self.base_url = url;
        }
        if let Some(prefix) = lookup("NODE_CATALOG_PREFIX") {
            self.admin_prefix = prefix;
        }
        if let Some(token) = lookup("NODE_CATALOG_TOKEN") {
            self.token = Some(token).filter(|t| !t.trim().is_empty());
        }
        if let Some(ttl) = lookup("NODE_CATALOG_TTL_MS") {
            match ttl.trim().parse() {
                Ok(ms) => self.cache_ttl_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid NODE_CATALOG_TTL_MS: {}", ttl),
            }
        }
        if let Some(modules) = lookup("NODE_CATALOG_CUSTOM_MODULES") {
            self.custom_modules = modules
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(verbose) = lookup("NODE_CATALOG_VERBOSE") {
            self.verbose_warnings = matches!(verbose.trim(), "1" | "true" | "yes" | "on");
        }
        self
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// `GET {baseUrl}{adminPrefix}/nodes` のURLを組み立てる
    pub fn nodes_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.admin_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}/nodes", base)
        } else {
            format!("{}/{}/nodes", base, prefix)
        }
    }

    /// ModuleMatcherを作成
    pub fn create_module_matcher(&self) -> ModuleMatcher {
        ModuleMatcher::new(&self.custom_modules)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.cache_ttl_ms, 60_000);
        assert_eq!(config.custom_modules.len(), 2);
        assert!(!config.verbose_warnings);
        assert_eq!(config.nodes_url(), "http://127.0.0.1:1880/nodes");
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "baseUrl": "http://red.local:1880/",
            "adminPrefix": "/admin/",
            "cacheTtlMs": 0,
            "customModules": ["node-red-contrib-acme"]
        }"#;
        let config: CatalogConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.nodes_url(), "http://red.local:1880/admin/nodes");
        assert_eq!(config.freshness(), Duration::ZERO);
        assert_eq!(config.custom_modules, vec!["node-red-contrib-acme".to_string()]);
    }

    #[test]
    fn test_empty_config() {
        let config: CatalogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:1880");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"verboseWarnings": true}"#).unwrap();
        let config = CatalogConfig::load_from_dir(dir.path());
        assert!(config.verbose_warnings);
    }

    #[test]
    fn test_broken_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            CatalogConfig::try_load_from_path(&path),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(CatalogConfig::load_from_path(&path).cache_ttl_ms, 60_000);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NODE_CATALOG_URL", "http://other:1880"),
            ("NODE_CATALOG_TTL_MS", "1500"),
            ("NODE_CATALOG_CUSTOM_MODULES", "a, b ,,c"),
            ("NODE_CATALOG_VERBOSE", "true"),
            ("NODE_CATALOG_TOKEN", "secret"),
        ]
        .into_iter()
        .collect();
        let config = CatalogConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://other:1880");
        assert_eq!(config.cache_ttl_ms, 1500);
        assert_eq!(config.custom_modules, vec!["a", "b", "c"]);
        assert!(config.verbose_warnings);
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_ttl_override_is_ignored() {
        let config = CatalogConfig::default()
            .with_overrides(|key| (key == "NODE_CATALOG_TTL_MS").then(|| "soon".to_string()));
        assert_eq!(config.cache_ttl_ms, 60_000);
    }
}
