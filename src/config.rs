//! Configuration for the search client
//!
//! Defaults:
//! - Breaker: opens after 5 consecutive failures, cools down for 60s
//! - Retry: 3 retries, 1s base delay doubling up to 10s
//! - Fusion: RRF k = 60, 100 kNN candidates
//! - Mock embeddings against `http://localhost:9200`

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::search::embedding::EmbeddingMode;
use crate::search::fusion::DEFAULT_RRF_K;

/// Default number of kNN candidates per shard
pub const DEFAULT_NUM_CANDIDATES: usize = 100;

/// Circuit breaker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a trial call
    pub timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

impl BreakerConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }
        if self.timeout.is_zero() {
            return Err("breaker timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Retry/backoff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles each retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.base_delay > self.max_delay {
            return Err("base_delay must not exceed max_delay".to_string());
        }
        Ok(())
    }
}

/// Settings that shape orchestrator behaviour, independent of transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    pub breaker: BreakerConfig,
    pub retry: RetryConfig,
    /// RRF constant used for hybrid fusion
    pub rrf_k: u32,
    /// kNN candidate pool size
    pub num_candidates: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
            rrf_k: DEFAULT_RRF_K,
            num_candidates: DEFAULT_NUM_CANDIDATES,
        }
    }
}

impl OrchestratorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.rrf_k == 0 {
            return Err(SearchError::InvalidArgument(
                "RRF constant k must be positive, got 0".to_string(),
            ));
        }
        if self.num_candidates == 0 {
            return Err(SearchError::Config(
                "num_candidates must be greater than 0".to_string(),
            ));
        }
        self.breaker.validate().map_err(SearchError::Config)?;
        self.retry.validate().map_err(SearchError::Config)?;
        Ok(())
    }
}

/// Full client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Elasticsearch base URL
    pub es_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Embedding backend
    pub embedding_mode: EmbeddingMode,
    pub settings: OrchestratorSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            es_url: "http://localhost:9200".to_string(),
            request_timeout: Duration::from_secs(30),
            embedding_mode: EmbeddingMode::Mock,
            settings: OrchestratorSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.es_url.trim().is_empty() {
            return Err(SearchError::Config("es_url must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(SearchError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }
        self.settings.validate()
    }

    /// Load configuration from the environment (and a `.env` file if present).
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ClientConfig::builder();

        if let Some(url) = lookup("ELASTICSEARCH_URL") {
            builder = builder.es_url(url);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "SEARCH_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(mode) = lookup("SEARCH_EMBEDDING_MODE") {
            let mode = match mode.trim().to_ascii_lowercase().as_str() {
                "mock" => EmbeddingMode::Mock,
                "real" => EmbeddingMode::Real,
                other => {
                    return Err(SearchError::Config(format!(
                        "SEARCH_EMBEDDING_MODE must be 'mock' or 'real', got '{}'",
                        other
                    )))
                }
            };
            builder = builder.embedding_mode(mode);
        }
        if let Some(k) = parse_var::<u32, _>(&lookup, "SEARCH_RRF_K")? {
            builder = builder.rrf_k(k);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "SEARCH_NUM_CANDIDATES")? {
            builder = builder.num_candidates(n);
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "SEARCH_BREAKER_THRESHOLD")? {
            builder = builder.failure_threshold(n);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "SEARCH_BREAKER_TIMEOUT_SECS")? {
            builder = builder.breaker_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "SEARCH_MAX_RETRIES")? {
            builder = builder.max_retries(n);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SEARCH_RETRY_BASE_DELAY_MS")? {
            builder = builder.base_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SEARCH_RETRY_MAX_DELAY_MS")? {
            builder = builder.max_delay(Duration::from_millis(ms));
        }

        let config = builder.build();
        config.validate()?;
        debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SearchError::Config(format!("invalid {}='{}': {}", key, raw, e))),
    }
}

/// Builder for client configuration
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    es_url: Option<String>,
    request_timeout: Option<Duration>,
    embedding_mode: Option<EmbeddingMode>,
    rrf_k: Option<u32>,
    num_candidates: Option<usize>,
    failure_threshold: Option<u32>,
    breaker_timeout: Option<Duration>,
    max_retries: Option<u32>,
    base_delay: Option<Duration>,
    max_delay: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn es_url(mut self, url: impl Into<String>) -> Self {
        self.es_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn embedding_mode(mut self, mode: EmbeddingMode) -> Self {
        self.embedding_mode = Some(mode);
        self
    }

    pub fn rrf_k(mut self, k: u32) -> Self {
        self.rrf_k = Some(k);
        self
    }

    pub fn num_candidates(mut self, n: usize) -> Self {
        self.num_candidates = Some(n);
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    pub fn breaker_timeout(mut self, timeout: Duration) -> Self {
        self.breaker_timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Build the client configuration
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        let settings = defaults.settings;

        ClientConfig {
            es_url: self.es_url.unwrap_or(defaults.es_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            embedding_mode: self.embedding_mode.unwrap_or(defaults.embedding_mode),
            settings: OrchestratorSettings {
                breaker: BreakerConfig {
                    failure_threshold: self
                        .failure_threshold
                        .unwrap_or(settings.breaker.failure_threshold),
                    timeout: self.breaker_timeout.unwrap_or(settings.breaker.timeout),
                },
                retry: RetryConfig {
                    max_retries: self.max_retries.unwrap_or(settings.retry.max_retries),
                    base_delay: self.base_delay.unwrap_or(settings.retry.base_delay),
                    max_delay: self.max_delay.unwrap_or(settings.retry.max_delay),
                },
                rrf_k: self.rrf_k.unwrap_or(settings.rrf_k),
                num_candidates: self.num_candidates.unwrap_or(settings.num_candidates),
            },
        }
    }
}
