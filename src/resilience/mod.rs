//! Failure handling around remote calls: circuit breaker and retry policy.

pub mod breaker;
pub mod retry;

pub use breaker::{BreakerSnapshot, BreakerState, CircuitBreaker};
pub use retry::RetryPolicy;
