//! ledgerquery: HTTP query and streaming client for remote ledger-query
//! services.
//!
//! The crate is organized around a small engine:
//!
//! - **client**: URL/filter composition, the generic request builder,
//!   link-driven pagination, and the resumable streaming subsystem.
//! - **resources**: per-endpoint configuration records and typed resource
//!   structs.
//! - **xdr**: the seam for the external binary-blob decoder; response
//!   fields ending in `_xdr` pass through undecoded.

pub mod client;
pub mod error;
pub mod resources;
pub mod xdr;

pub use crate::error::{Error, Result};

pub use crate::client::{
    CallBuilder, CallResponse, ClientConfig, LedgerClient, Link, Links, MAX_PAGE_LIMIT, Order,
    Page, Record, RetryConfig, RetryDecision, RetryState, SseEvent, SseParser, StreamHandle,
    StreamHandlers, StreamState, Subscription, UrlBuilder,
};
