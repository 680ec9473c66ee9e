//! Request/stream engine: URL composition, one-shot calls, link-driven
//! pagination, and resumable streaming subscriptions.

mod call;
mod config;
mod fetch;
mod http;
mod page;
pub mod retry;
mod sse;
mod stream;
mod url;

pub use call::{CallBuilder, MAX_PAGE_LIMIT, Order, Subscription};
pub use config::ClientConfig;
pub use fetch::LedgerClient;
pub use page::{CallResponse, Link, Links, Page, Record};
pub use retry::{RetryConfig, RetryDecision, RetryState};
pub use sse::{SseEvent, SseParser};
pub use stream::{OnError, OnMessage, StreamHandle, StreamHandlers, StreamState};
pub use self::url::UrlBuilder;
