//! # finsearch
//!
//! Resilient query orchestration for hybrid (keyword + vector) search over a
//! financial-document index (SEC filings, earnings-call transcripts, news).
//!
//! ## Features
//!
//! - Keyword (BM25), semantic (kNN) and hybrid search modes
//! - Client-side Reciprocal Rank Fusion with deterministic tie-breaking
//! - Circuit breaker that fails fast while the index is degraded
//! - Exponential-backoff retries for connectivity and rate-limit failures
//! - Typed error taxonomy deciding retry and breaker treatment
//!
//! ## Example
//!
//! ```no_run
//! use finsearch::{ClientConfig, SearchConfig, SearchMode, SearchOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     finsearch::logging::init_tracing();
//!
//!     let orchestrator = SearchOrchestrator::from_config(&ClientConfig::default())?;
//!     let config = SearchConfig::new()
//!         .with_ticker("AAPL")
//!         .with_date_range("2024-01-01", "2024-12-31")
//!         .with_limit(5);
//!
//!     let results = orchestrator
//!         .search("revenue growth", SearchMode::Hybrid, &config)
//!         .await?;
//!     for r in results {
//!         println!("[{:.4}] {}: {}", r.score, r.doc_id, r.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod resilience;
pub mod search;

// Re-export main types for convenience
pub use backend::{ElasticsearchBackend, SearchBackend, SearchRequest, SearchResponse};
pub use config::{BreakerConfig, ClientConfig, ClientConfigBuilder, OrchestratorSettings, RetryConfig};
pub use error::{FailureClass, Result, SearchError};
pub use resilience::{BreakerSnapshot, BreakerState, CircuitBreaker, RetryPolicy};
pub use search::{
    Collection, EmbeddingMode, EmbeddingProvider, FilterBuilder, FilterClause, MockEmbedding,
    RrfScorer, SearchConfig, SearchMode, SearchOrchestrator, SearchResult, UnconfiguredEmbedding,
};
