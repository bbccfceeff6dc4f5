use algexport_core::{AssetInfo, LedgerQuery, TransactionPage};
use anyhow::{Context, Result, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::wire::AssetResponse;

pub const DEFAULT_INDEXER_URL: &str = "http://localhost:8980";
/// Header a self-hosted indexer reads its API token from.
pub const DEFAULT_API_KEY_HEADER: &str = "X-Indexer-API-Token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub api_key_header: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INDEXER_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }
}

/// Indexer v2 client. One request per call; no retries.
pub struct IndexerClient {
    base_url: String,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl IndexerClient {
    pub fn new(config: &IndexerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let name = HeaderName::from_bytes(config.api_key_header.as_bytes())
                .with_context(|| format!("invalid api key header '{}'", config.api_key_header))?;
            headers.insert(name, HeaderValue::from_str(key).context("invalid api key")?);
        }

        Ok(Self {
            base_url: normalize_base_url(&config.url),
            headers,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "indexer request");

        let resp = self
            .http
            .get(&url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("indexer request {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("indexer error: {status} {txt}");
        }

        resp.json()
            .await
            .with_context(|| format!("parse indexer response from {url}"))
    }
}

impl LedgerQuery for IndexerClient {
    async fn account_transactions(
        &self,
        account: &str,
        min_round: u64,
        next_token: Option<&str>,
    ) -> Result<TransactionPage> {
        let mut query = vec![("min-round", min_round.to_string())];
        if let Some(token) = next_token.filter(|t| !t.is_empty()) {
            query.push(("next", token.to_string()));
        }
        self.get_json(&format!("/v2/accounts/{account}/transactions"), &query)
            .await
            .context("error looking up transactions")
    }

    async fn asset_info(&self, asset_id: u64) -> Result<AssetInfo> {
        let resp: AssetResponse = self
            .get_json(&format!("/v2/assets/{asset_id}"), &[])
            .await
            .with_context(|| format!("error looking up asset id {asset_id}"))?;
        Ok(resp.into())
    }
}

/// Accept `host:port` as well as full URLs; drop trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
