//! Elasticsearch HTTP backend
//!
//! Sends `_search` requests over HTTP with reqwest and maps transport and
//! status failures onto [`SearchError`] so the retry policy and circuit
//! breaker can classify them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{SearchBackend, SearchRequest, SearchResponse};
use crate::error::{Result, SearchError};

/// Search backend speaking the Elasticsearch REST API
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl ElasticsearchBackend {
    /// Create a backend for the cluster at `base_url`
    ///
    /// # Example
    /// ```no_run
    /// use finsearch::backend::ElasticsearchBackend;
    /// use std::time::Duration;
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let backend = ElasticsearchBackend::new("http://localhost:9200", Duration::from_secs(30))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| {
            SearchError::Config(format!("invalid Elasticsearch URL '{}': {}", trimmed, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SearchError::Config(format!(
                "Elasticsearch URL must start with http:// or https://, got '{}'",
                trimmed
            )));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Configured Elasticsearch backend at {}", base_url);

        Ok(Self {
            client,
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/{indices}/_search` with the index list as one encoded path segment
    fn search_url(&self, indices: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::Config(format!("cannot append a path to '{}'", self.base_url))
            })?
            .pop_if_empty()
            .push(&indices.join(","))
            .push("_search");
        Ok(url)
    }

    fn map_transport_error(&self, e: reqwest::Error, context: &str) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout {
                timeout_ms: duration_ms(self.request_timeout),
                context: context.to_string(),
            }
        } else {
            SearchError::Connection(format!("{}: {}", context, e))
        }
    }
}

/// Milliseconds in `d`, saturating at `u64::MAX`
fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Pull a readable reason out of an Elasticsearch error body
fn error_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/reason")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn search(&self, indices: &[String], request: &SearchRequest) -> Result<SearchResponse> {
        let target = indices.join(",");
        let url = self.search_url(indices)?;
        let context = format!("search {}", target);

        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, &context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e, &context))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Elasticsearch rate limited request to {}", target);
            return Err(SearchError::RateLimited(error_reason(&body)));
        }

        if !status.is_success() {
            let message = error_reason(&body);
            error!("Elasticsearch returned {} for {}: {}", status, target, message);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: SearchResponse = serde_json::from_str(&body)?;
        debug!("Received {} hits from {}", decoded.hits.hits.len(), target);
        Ok(decoded)
    }

    /// `GET /` on the cluster root
    async fn health_check(&self) -> Result<bool> {
        debug!("Executing Elasticsearch health check");

        let response = self
            .client
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, "health check"))?;

        let healthy = response.status().is_success();
        if healthy {
            debug!("Elasticsearch health check passed");
        } else {
            warn!("Elasticsearch health check returned {}", response.status());
        }
        Ok(healthy)
    }
}
