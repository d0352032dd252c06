use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::Upstream;
use crate::error::FetchError;

/// Longest upstream error body kept in a `FetchError`.
const MAX_ERROR_BODY: usize = 200;

/// Client for the SportMonks cricket v2 REST API.
/// Docs: <https://docs.sportmonks.com/cricket>
#[derive(Clone)]
pub struct SportMonksClient {
    http: Client,
    base_url: Url,
    api_token: String,
}

impl SportMonksClient {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid SportMonks URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("SportMonks URL cannot carry endpoint paths: {}", base_url);
        }
        let http = Client::builder()
            .user_agent(concat!("khelinfo-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(SportMonksClient {
            http,
            base_url,
            api_token: api_token.to_string(),
        })
    }

    fn url_for(&self, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so segments are always available
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(endpoint.split('/').filter(|s| !s.is_empty()));
        }
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("api_token", &self.api_token);
        url
    }
}

#[async_trait]
impl Upstream for SportMonksClient {
    fn name(&self) -> &str {
        "SportMonks"
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.url_for(endpoint, params);
        // The token is a query parameter, so log the endpoint rather than the URL
        debug!("Fetching {} from SportMonks", endpoint);

        let resp = self.http.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                truncate(&body, MAX_ERROR_BODY)
            };
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
