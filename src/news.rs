use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ProxyError;
use crate::resources::ResourceType;

/// Request-scoped proxy to the news provider (NewsAPI `/v2/everything`).
/// Nothing is cached; every call goes upstream.
#[derive(Clone)]
pub struct NewsClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid news API URL: {}", base_url))?;
        let http = Client::builder()
            .user_agent(concat!("khelinfo-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(NewsClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Latest English sports headlines, newest first, returned verbatim.
    pub async fn sports_headlines(&self) -> Result<Value, ProxyError> {
        let api_key = self.api_key.as_deref().ok_or(ProxyError::NotConfigured)?;
        let news = ResourceType::News;
        let url = Url::parse_with_params(
            &format!("{}/{}", self.base_url, news.endpoint()),
            news.params()
                .iter()
                .copied()
                .chain(std::iter::once(("apiKey", api_key))),
        )?;

        debug!("Fetching sports headlines");
        let resp = self.http.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProxyError::Status { status, body });
        }

        Ok(resp.json().await?)
    }
}
