//! Index backend abstraction
//!
//! The orchestrator talks to the document index only through
//! [`SearchBackend`]. Requests are typed ([`SearchRequest`]) and rendered to
//! the Elasticsearch query DSL by [`SearchRequest::to_body`]; responses are
//! decoded into [`SearchResponse`].

pub mod elasticsearch;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::search::filter::FilterClause;

pub use elasticsearch::ElasticsearchBackend;

/// Executes search requests against a set of collections
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one search request against `indices`
    async fn search(&self, indices: &[String], request: &SearchRequest) -> Result<SearchResponse>;

    /// Check that the index is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Nearest-neighbour query over the vector field
#[derive(Debug, Clone, PartialEq)]
pub struct KnnQuery {
    pub field: String,
    pub query_vector: Vec<f32>,
    pub k: usize,
    pub num_candidates: usize,
}

/// What a request retrieves by
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    /// Full-text match of `query` against `field`
    Lexical { field: String, query: String },
    /// kNN over an embedding
    Knn(KnnQuery),
}

/// One outbound search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub size: usize,
    pub exclude_fields: Vec<String>,
    pub filter: Vec<FilterClause>,
    pub kind: QueryKind,
}

impl SearchRequest {
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, QueryKind::Lexical { .. })
    }

    pub fn is_knn(&self) -> bool {
        matches!(self.kind, QueryKind::Knn(_))
    }

    /// Render as an Elasticsearch `_search` body
    pub fn to_body(&self) -> Value {
        let filter: Vec<Value> = self.filter.iter().map(FilterClause::to_value).collect();

        let mut body = json!({
            "size": self.size,
            "_source": { "excludes": self.exclude_fields },
        });

        match &self.kind {
            QueryKind::Lexical { field, query } => {
                body["query"] = json!({
                    "bool": {
                        "must": [ { "match": { field: query } } ],
                        "filter": filter,
                    }
                });
            }
            QueryKind::Knn(knn) => {
                body["knn"] = json!({
                    "field": knn.field,
                    "query_vector": knn.query_vector,
                    "k": knn.k,
                    "num_candidates": knn.num_candidates,
                    "filter": filter,
                });
            }
        }

        body
    }
}

/// Decoded `_search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// One hit as returned by the index
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl SearchResponse {
    pub fn from_hits(hits: Vec<RawHit>) -> Self {
        Self {
            hits: HitsEnvelope { hits },
        }
    }

    pub fn into_hits(self) -> Vec<RawHit> {
        self.hits.hits
    }
}
