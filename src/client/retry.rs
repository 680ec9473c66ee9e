//! Reconnect policy for streaming subscriptions.

use std::time::Duration;

use crate::error::is_retryable_status;

/// Configuration for stream reconnect behavior.
///
/// Backoff grows multiplicatively from `initial_backoff` up to the
/// `max_backoff` ceiling; the attempt counter resets on any successful
/// delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of consecutive reconnect attempts (None = unbounded).
    pub max_retries: Option<u32>,
    /// Backoff before the first reconnect attempt.
    pub initial_backoff: Duration,
    /// Multiplier applied to the backoff after each failed attempt.
    pub backoff_multiplier: f64,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Extra HTTP status codes to treat as transient. 5xx and 429 always are.
    pub retry_on_status: Vec<u16>,
    /// Whether to honor a server-suggested reconnect delay
    /// (the `retry:` field of the event stream).
    pub respect_server_delay: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            retry_on_status: Vec::new(),
            respect_server_delay: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never reconnects.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: Some(0),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = Some(max);
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_retry_on_status(mut self, status: u16) -> Self {
        if !self.retry_on_status.contains(&status) {
            self.retry_on_status.push(status);
        }
        self
    }

    #[must_use]
    pub fn with_respect_server_delay(mut self, respect: bool) -> Self {
        self.respect_server_delay = respect;
        self
    }

    /// Whether a response status should trigger a reconnect.
    #[must_use]
    pub fn is_transient_status(&self, status: u16) -> bool {
        is_retryable_status(status) || self.retry_on_status.contains(&status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    DontRetry,
}

/// Mutable reconnect state for one subscription.
#[derive(Debug, Clone)]
pub struct RetryState {
    pub attempts: u32,
    pub current_backoff: Duration,
    server_delay: Option<Duration>,
    config: RetryConfig,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            current_backoff: config.initial_backoff,
            server_delay: None,
            config,
        }
    }

    /// Decide whether to reconnect after a transport-level failure.
    pub fn should_retry_error(&mut self) -> RetryDecision {
        self.decide_retry()
    }

    /// Decide whether to reconnect after a non-2xx status.
    pub fn should_retry_status(&mut self, status: u16) -> RetryDecision {
        if !self.config.is_transient_status(status) {
            return RetryDecision::DontRetry;
        }
        self.decide_retry()
    }

    fn decide_retry(&mut self) -> RetryDecision {
        self.attempts += 1;
        if let Some(max) = self.config.max_retries {
            if self.attempts > max {
                return RetryDecision::DontRetry;
            }
        }

        let wait = if self.config.respect_server_delay {
            self.server_delay.unwrap_or(self.current_backoff)
        } else {
            self.current_backoff
        };

        self.current_backoff = std::cmp::min(
            self.current_backoff.mul_f64(self.config.backoff_multiplier),
            self.config.max_backoff,
        );

        RetryDecision::Retry(wait)
    }

    /// Record a server-suggested reconnect delay.
    pub fn set_server_delay(&mut self, delay: Duration) {
        self.server_delay = Some(delay);
    }

    /// Reset after a successful delivery.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_backoff = self.config.initial_backoff;
    }
}
