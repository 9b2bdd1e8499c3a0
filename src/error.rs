//! Error types for search orchestration
//!
//! Every failure the orchestrator can surface is a variant of [`SearchError`].
//! Each variant maps to exactly one [`FailureClass`], and the class alone
//! decides whether the retry policy tries again and whether the circuit
//! breaker counts the failure.

use thiserror::Error;

/// Main error type for search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// Circuit breaker is open; no request was sent
    #[error("Service unavailable: circuit breaker is {state}")]
    ServiceUnavailable { state: String },

    /// Connection error - the index could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timed out before the index answered
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    Timeout { timeout_ms: u64, context: String },

    /// Index answered with HTTP 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Index rejected the request (any non-429 error status)
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid caller-supplied argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A capability was invoked without being configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// How a failure is treated by the retry policy and the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Connectivity or timeout: retried, counted by the breaker
    Transient,
    /// HTTP 429: retried, not counted by the breaker
    RateLimited,
    /// The index rejected the query: surfaced immediately, not counted
    Protocol,
    /// Anything else from the call path: surfaced immediately, counted
    Unexpected,
    /// Caller or configuration mistake, or breaker fast-fail: surfaced only
    SurfaceOnly,
}

impl SearchError {
    /// Classify this error
    pub fn class(&self) -> FailureClass {
        match self {
            SearchError::Connection(_) | SearchError::Timeout { .. } => FailureClass::Transient,
            SearchError::RateLimited(_) => FailureClass::RateLimited,
            SearchError::Api { .. } => FailureClass::Protocol,
            SearchError::Serialization(_) | SearchError::Other(_) => FailureClass::Unexpected,
            SearchError::ServiceUnavailable { .. }
            | SearchError::InvalidArgument(_)
            | SearchError::NotConfigured(_)
            | SearchError::Config(_) => FailureClass::SurfaceOnly,
        }
    }

    /// Whether the retry policy should try the operation again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            FailureClass::Transient | FailureClass::RateLimited
        )
    }

    /// Whether the circuit breaker should record this as a failure
    pub fn counts_against_availability(&self) -> bool {
        matches!(
            self.class(),
            FailureClass::Transient | FailureClass::Unexpected
        )
    }
}

impl From<String> for SearchError {
    fn from(s: String) -> Self {
        SearchError::Other(s)
    }
}

impl From<&str> for SearchError {
    fn from(s: &str) -> Self {
        SearchError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Serialization(e.to_string())
    }
}

impl From<anyhow::Error> for SearchError {
    fn from(e: anyhow::Error) -> Self {
        SearchError::Other(format!("{:#}", e))
    }
}
