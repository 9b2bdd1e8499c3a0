//! Common types for search module

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SearchError;

/// Length of every embedding vector stored in the index
pub const EMBEDDING_DIMS: usize = 1536;

/// Source field holding the searchable document text
pub const TEXT_FIELD: &str = "text";

/// Source field holding the document embedding
pub const VECTOR_FIELD: &str = "embedding";

/// Collections (indices) known to the search client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    SecFilings,
    Transcripts,
    News,
}

impl Collection {
    /// All known collections, in default targeting order
    pub const ALL: [Collection; 3] = [
        Collection::SecFilings,
        Collection::Transcripts,
        Collection::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecFilings => "sec_filings",
            Self::Transcripts => "transcripts",
            Self::News => "news",
        }
    }
}

/// Retrieval strategy for a search call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// BM25 lexical match on the text field
    Keyword,
    /// kNN over the embedding field
    Semantic,
    /// Keyword and semantic in parallel, fused with RRF
    #[default]
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(SearchError::InvalidArgument(format!(
                "unknown search mode '{}' (expected keyword, semantic or hybrid)",
                other
            ))),
        }
    }
}

/// Search result with relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document ID (unique within its collection)
    pub doc_id: String,
    /// Index score, or the fused RRF score for hybrid searches
    pub score: f64,
    /// Document text
    pub content: String,
    /// Remaining source fields
    pub metadata: Map<String, Value>,
    /// Collection the hit came from
    pub source_index: String,
}

/// Per-call filtering and pagination
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Filter by ticker symbol
    pub ticker: Option<String>,
    /// Date range start (inclusive, ISO date)
    pub start_date: Option<String>,
    /// Date range end (inclusive, ISO date)
    pub end_date: Option<String>,
    /// Collections to search; all known collections when absent
    pub doc_types: Option<Vec<String>>,
    /// Additional field filters in insertion order; array values match any element
    pub filters: Vec<(String, Value)>,
    /// Maximum number of results per query
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ticker: None,
            start_date: None,
            end_date: None,
            doc_types: None,
            filters: Vec::new(),
            limit: 10,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    pub fn with_date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    /// Date range from calendar dates, formatted as `YYYY-MM-DD`
    pub fn with_dates(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.with_date_range(
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        )
    }

    pub fn with_doc_types<I, S>(mut self, doc_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc_types = Some(doc_types.into_iter().map(Into::into).collect());
        self
    }

    /// Add one known collection to the target set
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.doc_types
            .get_or_insert_with(Vec::new)
            .push(collection.as_str().to_string());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Reject configurations that cannot produce a valid query
    pub fn validate(&self) -> crate::Result<()> {
        if self.limit == 0 {
            return Err(SearchError::InvalidArgument(
                "limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Collections this call targets
    pub fn target_collections(&self) -> Vec<String> {
        match &self.doc_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => Collection::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
        }
    }
}
