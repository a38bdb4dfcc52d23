use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// エディタHTMLの取得元
#[async_trait]
pub trait HtmlSource: Send + Sync {
    /// 管理画面のノード一覧HTMLを取得する
    async fn fetch_html(&self) -> Result<String, CatalogError>;

    /// スナップショットに記録する取得元の識別子
    fn describe(&self) -> String;
}

/// `GET {baseUrl}{adminPrefix}/nodes` (Accept: text/html) で取得する
pub struct HttpHtmlSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpHtmlSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.nodes_url(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl HtmlSource for HttpHtmlSource {
    async fn fetch_html(&self) -> Result<String, CatalogError> {
        debug!("Fetching node catalog HTML from {}", self.url);

        let mut request = self.client.get(&self.url).header(ACCEPT, "text/html");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Node catalog request failed: {} - {}", status, body);
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
