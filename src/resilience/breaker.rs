//! Circuit breaker guarding calls to the search index

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakerState {
    /// Calls flow normally
    Closed,
    /// Calls are rejected until the timeout elapses
    Open,
    /// Cooldown elapsed; trial calls are allowed
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a breaker, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub failures: u32,
    pub failure_threshold: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Consecutive-failure circuit breaker.
///
/// The failure counter only resets on success, so a failure during the
/// half-open trial re-opens the breaker immediately.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    timeout: Duration,
    failures: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    state: BreakerState,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    ///
    /// `failure_threshold` and `timeout` are expected to be positive;
    /// [`BreakerConfig::validate`](crate::config::BreakerConfig::validate)
    /// enforces this for configured breakers.
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            failure_threshold,
            timeout,
            failures: 0,
            last_failure: None,
            last_failure_at: None,
            state: BreakerState::Closed,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state,
            failures: self.failures,
            failure_threshold: self.failure_threshold,
            last_failure_at: self.last_failure_at,
        }
    }

    /// Whether a new call may be attempted.
    ///
    /// An open breaker whose timeout has elapsed moves to half-open.
    pub fn can_execute(&mut self) -> bool {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled_down = self
                    .last_failure
                    .map(|at| at.elapsed() >= self.timeout)
                    .unwrap_or(false);
                if cooled_down {
                    self.state = BreakerState::HalfOpen;
                    info!("Circuit breaker entering half-open state");
                }
                cooled_down
            }
        }
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.last_failure = Some(Instant::now());
        self.last_failure_at = Some(Utc::now());

        if self.failures >= self.failure_threshold {
            if self.state != BreakerState::Open {
                warn!(
                    "Circuit breaker opened after {} consecutive failures",
                    self.failures
                );
            }
            self.state = BreakerState::Open;
        }
    }

    pub fn record_success(&mut self) {
        if self.state != BreakerState::Closed {
            info!("Circuit breaker closed after successful call");
        }
        self.failures = 0;
        self.state = BreakerState::Closed;
    }
}
