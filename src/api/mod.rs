//! HTTP client for the GauzMem backend.
//!
//! [`ApiClient`] wraps a `reqwest` client and an explicit [`ApiConfig`]
//! (base URL + project id). Every call reads the config that is current when
//! the call is made; [`ApiClient::set_config`] only affects later requests.

pub mod types;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use types::{
    Chunk, DashboardStats, Fact, FactPage, FlushResult, HealthStatus, IngestResult, RecallResult,
    SearchBundle, Speaker, Subgraph, SubgraphPage,
};

/// Page size used by the facts panel.
pub const FACTS_PAGE_SIZE: u32 = 20;

/// `top_k` sent with bundle searches.
pub const SEARCH_TOP_K: u32 = 20;

/// Connection settings for one backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without trailing slashes, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    pub project_id: String,
}

impl ApiConfig {
    pub fn new(base_url: &str, project_id: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            project_id: project_id.trim().to_string(),
        }
    }
}

/// Errors surfaced by list-style backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("API error: {0}")]
    Rejected(&'static str),
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Request body and target URL for a shutdown-time buffer flush.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushBeacon {
    pub url: String,
    pub body: Value,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stats: Option<DashboardStats>,
}

#[derive(Deserialize)]
struct FactsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    facts: Vec<Fact>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct ChunksEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    chunks: Vec<Chunk>,
}

#[derive(Deserialize)]
struct SubgraphsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    subgraphs: Vec<Subgraph>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize, Default)]
struct IngestEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct BundlesEnvelope {
    #[serde(default)]
    bundles: Vec<SearchBundle>,
}

/// Client for the dashboard, recall, search, and buffer endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    user_id: String,
}

impl ApiClient {
    pub fn new(config: ApiConfig, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            config,
            user_id: "playground".into(),
        })
    }

    /// Set the `user_id` attached to ingested messages.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Replace the connection settings. Last write wins.
    pub fn set_config(&mut self, config: ApiConfig) {
        tracing::info!(base = %config.base_url, project = %config.project_id, "api config updated");
        self.config = config;
    }

    /// Query the health endpoint. Never fails: transport errors map to `Offline`.
    pub async fn check_health(&self) -> HealthStatus {
        match self.health_body().await {
            Ok(data) if data.get("status").and_then(Value::as_str) == Some("healthy") => {
                HealthStatus::Healthy
            }
            Ok(_) => HealthStatus::Degraded,
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                HealthStatus::Offline
            }
        }
    }

    async fn health_body(&self) -> Result<Value, ApiError> {
        let url = self.url("/api/v1/admin/health", &[])?;
        let response = self.http.get(url).send().await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        let url = self.url(
            "/api/v1/admin/dashboard/stats",
            &[("project_id", self.config.project_id.as_str())],
        )?;
        let data: StatsEnvelope = self.get_json(url).await?;
        match data.stats {
            Some(stats) if data.success => Ok(stats),
            _ => Err(ApiError::Rejected("failed to load stats")),
        }
    }

    pub async fn fetch_facts(
        &self,
        page: u32,
        sort: &str,
        min_score: &str,
    ) -> Result<FactPage, ApiError> {
        let url = self.url(
            "/api/v1/admin/dashboard/facts",
            &[
                ("project_id", self.config.project_id.as_str()),
                ("page", page.to_string().as_str()),
                ("page_size", FACTS_PAGE_SIZE.to_string().as_str()),
                ("sort", sort),
                ("min_score", min_score),
            ],
        )?;
        let data: FactsEnvelope = self.get_json(url).await?;
        if !data.success {
            return Err(ApiError::Rejected("facts request rejected"));
        }
        Ok(FactPage {
            facts: data.facts,
            total: data.total,
        })
    }

    /// Facts the backend could not attach to any relation.
    pub async fn fetch_unresolved(&self) -> Result<FactPage, ApiError> {
        let url = self.url(
            "/api/v1/admin/dashboard/unresolved",
            &[("project_id", self.config.project_id.as_str())],
        )?;
        let data: FactsEnvelope = self.get_json(url).await?;
        if !data.success {
            return Err(ApiError::Rejected("unresolved request rejected"));
        }
        let total = if data.total > 0 {
            data.total
        } else {
            data.facts.len() as u64
        };
        Ok(FactPage {
            facts: data.facts,
            total,
        })
    }

    pub async fn fetch_chunks(&self) -> Result<Vec<Chunk>, ApiError> {
        let url = self.url(
            "/api/v1/admin/dashboard/chunks",
            &[("project_id", self.config.project_id.as_str())],
        )?;
        let data: ChunksEnvelope = self.get_json(url).await?;
        if !data.success {
            return Err(ApiError::Rejected("chunks request rejected"));
        }
        Ok(data.chunks)
    }

    pub async fn fetch_chunk_facts(&self, chunk_id: i64) -> Result<Vec<Fact>, ApiError> {
        let url = self.url(
            &format!("/api/v1/admin/dashboard/chunks/{chunk_id}/facts"),
            &[("project_id", self.config.project_id.as_str())],
        )?;
        let data: FactsEnvelope = self.get_json(url).await?;
        if !data.success {
            return Err(ApiError::Rejected("chunk facts request rejected"));
        }
        Ok(data.facts)
    }

    /// Fetch one page of relation subgraphs.
    pub async fn fetch_subgraphs(&self, page: u32, page_size: u32) -> Result<SubgraphPage, ApiError> {
        let url = self.url(
            "/api/v1/admin/dashboard/subgraphs",
            &[
                ("project_id", self.config.project_id.as_str()),
                ("page", page.to_string().as_str()),
                ("page_size", page_size.to_string().as_str()),
            ],
        )?;
        let data: SubgraphsEnvelope = self.get_json(url).await?;
        if !data.success {
            return Err(ApiError::Rejected("subgraphs request rejected"));
        }
        tracing::debug!(page, returned = data.subgraphs.len(), total = data.total, "subgraphs fetched");
        Ok(SubgraphPage {
            subgraphs: data.subgraphs,
            total: data.total,
        })
    }

    pub async fn search_bundles(&self, query: &str) -> Result<Vec<SearchBundle>, ApiError> {
        let url = self.url("/api/v1/memories/search/bundle", &[])?;
        let body = json!({
            "project_id": self.config.project_id,
            "query": query,
            "top_k": SEARCH_TOP_K,
            "search_mode": "hybrid",
        });
        let data: BundlesEnvelope = self.post_json(url, &body).await?;
        Ok(data.bundles)
    }

    /// Natural-language recall for `query`, ready to drop into an LLM prompt.
    pub async fn passive_recall(&self, query: &str) -> Result<RecallResult, ApiError> {
        let url = self.url("/api/v1/memories/recall", &[])?;
        let body = json!({
            "project_id": self.config.project_id,
            "query": query,
        });
        self.post_json(url, &body).await
    }

    /// Push one conversation message into the backend's source buffer.
    pub async fn ingest_message(&self, text: &str, speaker: Speaker) -> Result<IngestResult, ApiError> {
        let url = self.url("/api/v1/memories/messages", &[])?;
        let body = json!({
            "project_id": self.config.project_id,
            "message": {
                "text": text,
                "speaker": speaker,
                "user_id": self.user_id,
            },
            "async_mode": true,
        });
        let data: IngestEnvelope = self.post_json_or_default(url, &body).await?;
        Ok(IngestResult {
            success: data.success.unwrap_or(true),
            status: data.status,
        })
    }

    /// Explicitly flush the source buffer (session end).
    ///
    /// A non-2xx answer is an error, never a silent `flushed: false`.
    pub async fn flush_buffer(&self, content_type: &str) -> Result<FlushResult, ApiError> {
        let url = self.url("/api/v1/memories/buffer/flush", &[])?;
        let body = self.flush_body(content_type);
        self.post_json_or_default(url, &body).await
    }

    /// The flush request as plain data, for callers that send it themselves.
    pub fn flush_beacon(&self, content_type: &str) -> Result<FlushBeacon, ApiError> {
        let url = self.url("/api/v1/memories/buffer/flush", &[])?;
        Ok(FlushBeacon {
            url: url.to_string(),
            body: self.flush_body(content_type),
        })
    }

    fn flush_body(&self, content_type: &str) -> Value {
        json!({
            "project_id": self.config.project_id,
            "content_type": content_type,
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        if self.config.base_url.is_empty() {
            return Err(ApiError::InvalidUrl("API base URL is not configured".into()));
        }
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.config.base_url)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }

    /// Like [`post_json`](Self::post_json), but a 2xx with an empty body
    /// yields `T::default()`.
    async fn post_json_or_default<T: DeserializeOwned + Default>(
        &self,
        url: Url,
        body: &Value,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        let text = success_body(response).await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a response into `T`, surfacing the backend's `detail` on non-2xx.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let body = success_body(response).await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The body of a 2xx response, or `ApiError::Status` carrying the backend's `detail`.
async fn success_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        tracing::warn!(%status, %detail, "backend returned an error");
        return Err(ApiError::Status { status, detail });
    }
    Ok(body)
}
