//! Mode-dispatching search orchestrator
//!
//! Ties the breaker, retry policy, filter builder, embedding provider and
//! RRF scorer together behind a single `search` call.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::try_join;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::embedding::{provider_for, EmbeddingProvider};
use super::filter::{FilterBuilder, FilterClause};
use super::fusion::RrfScorer;
use super::types::{SearchConfig, SearchMode, SearchResult, TEXT_FIELD, VECTOR_FIELD};
use crate::backend::{
    ElasticsearchBackend, KnnQuery, QueryKind, RawHit, SearchBackend, SearchRequest,
    SearchResponse,
};
use crate::config::{ClientConfig, OrchestratorSettings};
use crate::error::{Result, SearchError};
use crate::resilience::{BreakerSnapshot, CircuitBreaker, RetryPolicy};

/// Characters of the query echoed into log lines
const QUERY_LOG_PREFIX: usize = 50;

/// Public entry point for keyword, semantic and hybrid search.
///
/// Owns its circuit breaker; breaker state is never shared between
/// orchestrator instances.
pub struct SearchOrchestrator {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    breaker: Mutex<CircuitBreaker>,
    retry: RetryPolicy,
    scorer: RrfScorer,
    num_candidates: usize,
}

impl SearchOrchestrator {
    /// Create an orchestrator over an existing backend and embedder
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: OrchestratorSettings,
    ) -> Result<Self> {
        settings.validate()?;
        debug!(
            "Creating search orchestrator: breaker threshold {}, up to {} retries, worst-case backoff {:?}",
            settings.breaker.failure_threshold,
            settings.retry.max_retries,
            worst_case_backoff(&settings)
        );

        Ok(Self {
            backend,
            embedder,
            breaker: Mutex::new(CircuitBreaker::new(
                settings.breaker.failure_threshold,
                settings.breaker.timeout,
            )),
            retry: RetryPolicy::from_config(&settings.retry),
            scorer: RrfScorer::new(settings.rrf_k)?,
            num_candidates: settings.num_candidates,
        })
    }

    /// Create an orchestrator talking to Elasticsearch over HTTP
    ///
    /// # Example
    /// ```no_run
    /// use finsearch::{ClientConfig, SearchConfig, SearchMode, SearchOrchestrator};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let orchestrator = SearchOrchestrator::from_config(&ClientConfig::from_env()?)?;
    ///     let config = SearchConfig::new().with_ticker("AAPL").with_limit(5);
    ///
    ///     let results = orchestrator
    ///         .search("revenue growth", SearchMode::Hybrid, &config)
    ///         .await?;
    ///     for r in results {
    ///         println!("[{:.4}] {}", r.score, r.doc_id);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let backend = ElasticsearchBackend::new(&config.es_url, config.request_timeout)?;
        Self::new(
            Arc::new(backend),
            provider_for(config.embedding_mode),
            config.settings.clone(),
        )
    }

    /// Current breaker state
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker().snapshot()
    }

    /// Ping the index; does not affect the breaker
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// Search `config`'s collections for `query` using `mode`.
    ///
    /// Fails fast with `ServiceUnavailable` while the breaker is open. The
    /// dispatch is retried per the retry policy; the breaker records a single
    /// outcome for the whole retried call.
    pub async fn search(
        &self,
        query: &str,
        mode: SearchMode,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>> {
        config.validate()?;

        {
            let mut breaker = self.breaker();
            if !breaker.can_execute() {
                let state = breaker.state();
                warn!("Rejecting {} search: circuit breaker is {}", mode, state);
                return Err(SearchError::ServiceUnavailable {
                    state: state.to_string(),
                });
            }
        }

        let indices = config.target_collections();
        let filters = FilterBuilder::from_config(config);
        let query_prefix = log_prefix(query);

        info!(
            "Search request: query='{}', mode={}, indices={}, ticker={:?}, filters={}",
            query_prefix,
            mode,
            indices.join(","),
            config.ticker,
            filters.len()
        );

        let outcome = self
            .retry
            .run("search", || {
                self.dispatch(query, mode, &indices, &filters, config.limit)
            })
            .await;

        match &outcome {
            Ok(results) => {
                self.breaker().record_success();
                info!("{} search successful: returned {} results", mode, results.len());
            }
            Err(e) if e.counts_against_availability() => {
                self.breaker().record_failure();
                error!(
                    "Search failed: {}. Query: '{}', indices: {}, filters: {}",
                    e,
                    query_prefix,
                    indices.join(","),
                    filters.len()
                );
            }
            Err(e) => {
                error!(
                    "Search rejected: {}. Query: '{}', indices: {}, filters: {}",
                    e,
                    query_prefix,
                    indices.join(","),
                    filters.len()
                );
            }
        }

        outcome
    }

    async fn dispatch(
        &self,
        query: &str,
        mode: SearchMode,
        indices: &[String],
        filters: &[FilterClause],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        match mode {
            SearchMode::Keyword => {
                let request = lexical_request(query, filters, limit);
                let response = self.backend.search(indices, &request).await?;
                Ok(parse_hits(response))
            }
            SearchMode::Semantic => {
                let vector = self.embedder.generate(query).await?;
                let request = knn_request(vector, filters, limit, self.num_candidates);
                let response = self.backend.search(indices, &request).await?;
                Ok(parse_hits(response))
            }
            SearchMode::Hybrid => {
                let vector = self.embedder.generate(query).await?;
                let lexical = lexical_request(query, filters, limit);
                let knn = knn_request(vector, filters, limit, self.num_candidates);

                let (lexical_response, knn_response) = try_join(
                    self.backend.search(indices, &lexical),
                    self.backend.search(indices, &knn),
                )
                .await?;

                self.scorer.merge(
                    vec![parse_hits(lexical_response), parse_hits(knn_response)],
                    None,
                )
            }
        }
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("breaker", &self.breaker_snapshot())
            .field("retry", &self.retry)
            .field("rrf_k", &self.scorer.default_k())
            .field("num_candidates", &self.num_candidates)
            .finish()
    }
}

fn lexical_request(query: &str, filters: &[FilterClause], limit: usize) -> SearchRequest {
    SearchRequest {
        size: limit,
        exclude_fields: vec![VECTOR_FIELD.to_string()],
        filter: filters.to_vec(),
        kind: QueryKind::Lexical {
            field: TEXT_FIELD.to_string(),
            query: query.to_string(),
        },
    }
}

fn knn_request(
    vector: Vec<f32>,
    filters: &[FilterClause],
    limit: usize,
    num_candidates: usize,
) -> SearchRequest {
    SearchRequest {
        size: limit,
        exclude_fields: vec![VECTOR_FIELD.to_string()],
        filter: filters.to_vec(),
        kind: QueryKind::Knn(KnnQuery {
            field: VECTOR_FIELD.to_string(),
            query_vector: vector,
            k: limit,
            num_candidates,
        }),
    }
}

/// Convert raw hits into results, keeping index order
pub fn parse_hits(response: SearchResponse) -> Vec<SearchResult> {
    response.into_hits().into_iter().map(parse_hit).collect()
}

fn parse_hit(hit: RawHit) -> SearchResult {
    let RawHit {
        id,
        score,
        index,
        mut source,
    } = hit;

    let content = match source.remove(TEXT_FIELD) {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    source.remove(VECTOR_FIELD);

    SearchResult {
        doc_id: id,
        score: score.unwrap_or(0.0),
        content,
        metadata: source,
        source_index: index,
    }
}

fn log_prefix(query: &str) -> String {
    let prefix: String = query.chars().take(QUERY_LOG_PREFIX).collect();
    if prefix.len() < query.len() {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

/// Total sleep time of a fully exhausted retry sequence.
///
/// Added on top of per-request timeouts, this bounds how long a failing
/// `search` call can take before it surfaces an error.
pub fn worst_case_backoff(settings: &OrchestratorSettings) -> Duration {
    let policy = RetryPolicy::from_config(&settings.retry);
    (0..policy.max_retries())
        .map(|attempt| policy.delay_for(attempt))
        .sum()
}
