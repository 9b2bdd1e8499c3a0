//! Search module
//!
//! Filter construction, query embedding, rank fusion and the orchestrator
//! that dispatches keyword, semantic and hybrid searches.

pub mod embedding;
pub mod filter;
pub mod fusion;
pub mod orchestrator;
pub mod types;

pub use embedding::{
    provider_for, EmbeddingMode, EmbeddingProvider, MockEmbedding, UnconfiguredEmbedding,
};
pub use filter::{FilterBuilder, FilterClause};
pub use fusion::{RrfScorer, DEFAULT_RRF_K};
pub use orchestrator::{parse_hits, worst_case_backoff, SearchOrchestrator};
pub use types::{
    Collection, SearchConfig, SearchMode, SearchResult, EMBEDDING_DIMS, TEXT_FIELD, VECTOR_FIELD,
};
