//! Configuration for the ledger-query client.
//!
//! All knobs are explicit values threaded into the client constructor —
//! never process-wide mutable state.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `base_url` | required | Root URL of the query service |
//! | `request_timeout` | 30s | Per-request timeout for one-shot calls |
//! | `user_agent` | `ledgerquery/<version>` | `User-Agent` header value |
//! | `retry` | see [`RetryConfig`] | Streaming reconnect policy |
//!
//! The one-shot timeout deliberately does not apply to long-lived stream
//! reads; streams are bounded by the reconnect policy instead.
//!
//! # Examples
//!
//! ```
//! use ledgerquery::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     request_timeout: Duration::from_secs(10),
//!     ..ClientConfig::new("https://query.example.org".parse().unwrap())
//! };
//! assert_eq!(config.request_timeout, Duration::from_secs(10));
//! ```

use std::time::Duration;

use url::Url;

use crate::client::retry::RetryConfig;

/// Configuration for a [`LedgerClient`](crate::LedgerClient) instance.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Root URL of the query service. Required.
    pub base_url: Url,

    /// Timeout for one-shot requests.
    ///
    /// Also used as the connect timeout when opening stream connections.
    pub request_timeout: Duration,

    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Reconnect policy for streaming subscriptions.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        ClientConfig {
            base_url,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("ledgerquery/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryConfig::default(),
        }
    }
}
