//! Error types for ledger-query operations.
//!
//! The [`Result`] type alias provides a convenient shorthand for operations
//! that may fail.
//!
//! # Error Categories
//!
//! | Category | Variants | Retryable |
//! |----------|----------|-----------|
//! | Configuration | `Config` | No |
//! | Transport | `Transport` | Yes |
//! | Server | `Server` | 429 and 5xx only |
//! | Response shape | `Json`, `MalformedResponse`, `MissingLink` | No |
//! | Stream lifecycle | `StreamClosed` | No |
//!
//! Configuration errors are raised before any request leaves the process;
//! everything else is reported at the boundary nearest its origin — the
//! returned future for one-shot calls, the `on_error` handler for streams.

use thiserror::Error;

/// Result type for ledger-query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, executing, or streaming queries.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or conflicting filter/parameter combination.
    ///
    /// Raised synchronously when the request URL is built, never sent to
    /// the network.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection-level failure: refused, DNS, timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status, carrying the problem body verbatim.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// JSON decoding failed for a response body or stream event payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body parsed as JSON but is missing an expected field
    /// (`_links`, `_embedded.records`) or carries an unusable link href.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A link follow named a relation the record does not carry.
    #[error("record has no link named {0:?}")]
    MissingLink(String),

    /// The stream terminated after its retry budget was exhausted.
    #[error("stream closed after retries exhausted")]
    StreamClosed,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl Error {
    /// Check if this error is worth retrying inside a stream.
    ///
    /// Transport errors and rate-limit/server-side statuses are transient;
    /// everything else indicates the request itself is wrong.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Server { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// 429 and 5xx are transient; any other 4xx means retrying cannot help.
#[inline]
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_is_retryable() {
        assert!(Error::Transport("connection refused".into()).is_retryable());
    }

    #[test]
    fn test_server_503_is_retryable() {
        let err = Error::Server {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_404_not_retryable() {
        let err = Error::Server {
            status: 404,
            body: String::new(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(504));
    }

    #[test]
    fn test_config_not_retryable() {
        assert!(!Error::Config("conflicting filters".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Server {
            status: 400,
            body: "bad request".into(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn test_missing_link_display() {
        let err = Error::MissingLink("transaction".into());
        assert!(err.to_string().contains("transaction"));
    }
}
