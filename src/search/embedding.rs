//! Query embedding generation for vector search

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::types::EMBEDDING_DIMS;
use crate::error::{Result, SearchError};

/// Value of every component of the mock embedding
pub const MOCK_EMBEDDING_VALUE: f32 = 0.001;

/// Turns query text into a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimension (vector length)
    fn dimension(&self) -> usize;

    /// Generate the embedding for a query string
    async fn generate(&self, text: &str) -> Result<Vec<f32>>;
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic constant vector, for tests and local runs
    #[default]
    Mock,
    /// Real embedding model (not wired up in this crate)
    Real,
}

/// Deterministic embedding that ignores its input
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMS
    }

    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating mock embedding for {} chars", text.len());
        Ok(vec![MOCK_EMBEDDING_VALUE; EMBEDDING_DIMS])
    }
}

/// Placeholder for a real model; every call fails with `NotConfigured`
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredEmbedding;

#[async_trait]
impl EmbeddingProvider for UnconfiguredEmbedding {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMS
    }

    async fn generate(&self, _text: &str) -> Result<Vec<f32>> {
        error!("Real embedding model requested but none is configured");
        Err(SearchError::NotConfigured(
            "real embedding model not configured".to_string(),
        ))
    }
}

/// Build the provider for a configured mode
pub fn provider_for(mode: EmbeddingMode) -> Arc<dyn EmbeddingProvider> {
    match mode {
        EmbeddingMode::Mock => Arc::new(MockEmbedding),
        EmbeddingMode::Real => Arc::new(UnconfiguredEmbedding),
    }
}
