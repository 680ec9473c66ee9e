//! Generic request builder over one endpoint configuration.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::http::Dispatch;
use crate::client::page::{CallResponse, Record, map_response};
use crate::client::retry::RetryConfig;
use crate::client::stream::{StreamEngine, StreamHandle, StreamHandlers, StreamState};
use crate::client::url::UrlBuilder;
use crate::error::Result;
use crate::resources::EndpointDef;

/// Server-assigned ordering of records within a filter scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Largest page size the server documents.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Builds and executes queries against one endpoint.
///
/// Configuration methods consume and return the builder. A builder is
/// reusable: `call()` captures a URL snapshot at invocation, so later
/// mutation never affects an already-issued request. Invalid configuration
/// (bad limit, illegal flag, conflicting filters) is recorded immediately
/// and surfaced when the URL is built — before anything reaches the
/// network.
#[derive(Debug, Clone)]
pub struct CallBuilder<T> {
    builder: UrlBuilder,
    endpoint: &'static EndpointDef,
    dispatch: Arc<Dispatch>,
    retry: RetryConfig,
    cursor: Option<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T> CallBuilder<T> {
    pub(crate) fn new(
        builder: UrlBuilder,
        endpoint: &'static EndpointDef,
        dispatch: Arc<Dispatch>,
        retry: RetryConfig,
    ) -> Self {
        CallBuilder {
            builder,
            endpoint,
            dispatch,
            retry,
            cursor: None,
            _record: PhantomData,
        }
    }

    /// Append a literal path component (single-resource specialization).
    pub(crate) fn segment(mut self, name: &str) -> Self {
        self.builder = self.builder.segment(name);
        self
    }

    /// Resume from an opaque server-assigned position.
    #[must_use]
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        let cursor = cursor.into();
        self.builder = self.builder.set_query("cursor", &cursor);
        self.cursor = Some(cursor);
        self
    }

    /// Page size, validated client-side against the documented bound.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            self.builder
                .invalidate(format!("limit must be within 1..={MAX_PAGE_LIMIT}, got {limit}"));
        } else {
            self.builder = self.builder.set_query("limit", &limit.to_string());
        }
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.builder = self.builder.set_query("order", order.as_str());
        self
    }

    /// Set an endpoint-specific query flag, e.g. `include_failed`.
    #[must_use]
    pub fn flag(mut self, key: &str, value: &str) -> Self {
        if self.endpoint.allows_flag(key) {
            self.builder = self.builder.set_query(key, value);
        } else {
            self.builder.invalidate(format!(
                "flag {key:?} is not valid for the {} endpoint",
                self.endpoint.segment
            ));
        }
        self
    }

    /// Scope to one account's records.
    #[must_use]
    pub fn for_account(self, account_id: &str) -> Self {
        self.filtered("account", vec!["accounts".to_string(), account_id.to_string()])
    }

    /// Scope to one ledger's records.
    #[must_use]
    pub fn for_ledger(self, sequence: u32) -> Self {
        self.filtered("ledger", vec!["ledgers".to_string(), sequence.to_string()])
    }

    /// Scope to one transaction's records.
    #[must_use]
    pub fn for_transaction(self, hash: &str) -> Self {
        self.filtered(
            "transaction",
            vec!["transactions".to_string(), hash.to_string()],
        )
    }

    /// Scope to one claimable balance's records.
    #[must_use]
    pub fn for_claimable_balance(self, balance_id: &str) -> Self {
        self.filtered(
            "claimable_balance",
            vec!["claimable_balances".to_string(), balance_id.to_string()],
        )
    }

    fn filtered(mut self, dimension: &str, parts: Vec<String>) -> Self {
        if self.endpoint.allows_filter(dimension) {
            self.builder = self.builder.push_filter(parts);
        } else {
            self.builder.invalidate(format!(
                "filter {dimension:?} is not valid for the {} endpoint",
                self.endpoint.segment
            ));
        }
        self
    }

    /// The exact URL `call()` would issue right now.
    pub fn url(&self) -> Result<Url> {
        self.builder.build()
    }
}

impl<T: DeserializeOwned> CallBuilder<T> {
    /// Build the URL, issue exactly one GET, and map the body: a single
    /// resource becomes a [`Record`], a collection envelope a
    /// [`Page`](crate::Page).
    pub async fn call(&self) -> Result<CallResponse<T>> {
        let url = self.url()?;
        tracing::debug!(url = %url, "one-shot call");
        let value = self.dispatch.get_json(url).await?;
        map_response(value, Arc::clone(&self.dispatch))
    }
}

impl<T: DeserializeOwned + Send + 'static> CallBuilder<T> {
    /// Open a live feed over the same filters and parameters, delivering
    /// each record to the caller's handlers. Seeded with the builder's
    /// cursor if set, else "from now".
    pub fn stream(&self, handlers: StreamHandlers<T>) -> Result<StreamHandle> {
        let url = self.url()?;
        Ok(StreamEngine::spawn(
            url,
            self.cursor.clone(),
            Arc::clone(&self.dispatch),
            self.retry.clone(),
            handlers,
        ))
    }

    /// Pull-based variant of [`stream`](CallBuilder::stream): the same
    /// engine, with deliveries queued behind a receiver.
    pub fn subscribe(&self) -> Result<Subscription<T>> {
        let (tx, rx) = async_channel::unbounded();
        let tx_err = tx.clone();
        let handlers = StreamHandlers::new(move |record| {
            let _ = tx.try_send(Ok(record));
        })
        .on_error(move |error| {
            let _ = tx_err.try_send(Err(error));
        });
        let handle = self.stream(handlers)?;
        Ok(Subscription {
            receiver: rx,
            handle,
        })
    }
}

/// A pull-based subscription: records (and per-event errors) arrive on a
/// queue instead of through callbacks.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: async_channel::Receiver<Result<Record<T>>>,
    handle: StreamHandle,
}

impl<T> Subscription<T> {
    /// Wait for the next delivery. `None` once the subscription is closed
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Result<Record<T>>> {
        self.receiver.recv().await.ok()
    }

    #[must_use]
    pub fn state(&self) -> StreamState {
        self.handle.state()
    }

    /// Close the underlying connection and wait for delivery to quiesce.
    pub async fn close(self) {
        self.handle.close().await;
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<Record<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // `async_channel::Receiver` is `!Unpin`, so project the pin to the
        // field structurally rather than moving it out. The receiver is never
        // moved, so this projection is sound.
        let receiver = unsafe { self.map_unchecked_mut(|s| &mut s.receiver) };
        receiver.poll_next(cx)
    }
}
