use crate::record::ArticleRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use newsroom_core::{ArticleSummary, ContentStore, FetchError};
use reqwest::{header, Client};
use url::Url;
use std::time::Duration;

const SELECT: &str = "id,title,slug,excerpt,category:categories(name),author:profiles(username)";

/// Connection settings for a PostgREST-style backend (`{base_url}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    /// Anonymous (read-only) API key, sent as `apikey` and as bearer token.
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), ..Self::default() }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".into(),
            api_key: String::new(),
            table: "articles".into(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("newsroom-search/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Reads published article summaries over HTTP.
pub struct RestContentStore {
    client: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl RestContentStore {
    pub fn new(config: RestConfig) -> Result<Self> {
        let endpoint = endpoint_url(&config.base_url, &config.table)?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, endpoint, api_key: config.api_key, timeout: config.timeout })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// `{base}/rest/v1/{table}?select=..&status=eq.published&order=published_at.desc`
pub fn endpoint_url(base_url: &str, table: &str) -> Result<Url> {
    let base = Url::parse(base_url.trim_end_matches('/')).with_context(|| format!("invalid content store url {base_url}"))?;
    let mut url = base.join(&format!("{}/rest/v1/{table}", base.path().trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("select", SELECT)
        .append_pair("status", "eq.published")
        .append_pair("order", "published_at.desc");
    Ok(url)
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn fetch_published(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        let mut req = self.client.get(self.endpoint.clone()).header(header::ACCEPT, "application/json");
        if !self.api_key.is_empty() {
            req = req.header("apikey", &self.api_key).bearer_auth(&self.api_key);
        }
        let resp = req.send().await.map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        let records: Vec<ArticleRecord> = serde_json::from_slice(&bytes)?;
        let total = records.len();
        let articles: Vec<ArticleSummary> =
            records.into_iter().filter(ArticleRecord::is_published).map(ArticleRecord::into_summary).collect();
        tracing::debug!(total, published = articles.len(), endpoint = %self.endpoint, "fetched articles");
        Ok(articles)
    }

    fn name(&self) -> &str {
        "rest"
    }
}
