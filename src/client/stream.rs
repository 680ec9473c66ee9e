//! Streaming subscriptions over a long-lived server-push connection.
//!
//! The engine owns the connection lifetime and the last-seen cursor. On
//! every (re)connect it appends the stored cursor to the derived URL, so
//! the server resumes exactly after the last delivered record — delivery
//! is at-least-once, never skipping. Transient failures (transport errors,
//! 429, 5xx) reconnect with growing backoff; other 4xx statuses are fatal.
//! A single malformed event is reported through `on_error` without closing
//! the subscription.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

use crate::client::http::Dispatch;
use crate::client::page::{Record, map_record};
use crate::client::retry::{RetryConfig, RetryDecision, RetryState};
use crate::client::sse::{SseEvent, SseParser};
use crate::error::Error;

/// Record delivery callback.
pub type OnMessage<T> = Arc<dyn Fn(Record<T>) + Send + Sync>;

/// Error delivery callback. Receives both per-event errors (subscription
/// stays open) and the terminal error that closes the subscription.
pub type OnError = Arc<dyn Fn(Error) + Send + Sync>;

/// Caller callbacks for one subscription.
pub struct StreamHandlers<T> {
    pub(crate) on_message: OnMessage<T>,
    pub(crate) on_error: Option<OnError>,
}

impl<T> StreamHandlers<T> {
    pub fn new<F>(on_message: F) -> Self
    where
        F: Fn(Record<T>) + Send + Sync + 'static,
    {
        StreamHandlers {
            on_message: Arc::new(on_message),
            on_error: None,
        }
    }

    #[must_use]
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }
}

impl<T> fmt::Debug for StreamHandlers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Lifecycle of a subscription. `Closed` is terminal, entered only by an
/// explicit [`StreamHandle::close`] or a non-retryable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

/// Handle to one active subscription.
///
/// Exclusively owned by its creator, who is responsible for calling
/// [`close`](StreamHandle::close): an abandoned handle keeps its
/// connection alive until a fatal error or process teardown.
#[derive(Debug)]
pub struct StreamHandle {
    state: watch::Receiver<StreamState>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == StreamState::Closed
    }

    /// Tear down the connection and wait for delivery to quiesce.
    ///
    /// After this returns, zero further handler invocations occur — even
    /// for events already in flight over the network at the moment of
    /// closing.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

pub(crate) struct StreamEngine<T> {
    url: Url,
    cursor: String,
    dispatch: Arc<Dispatch>,
    retry: RetryState,
    handlers: StreamHandlers<T>,
    state: watch::Sender<StreamState>,
    shutdown: watch::Receiver<bool>,
}

impl<T: DeserializeOwned + Send + 'static> StreamEngine<T> {
    /// Spawn the engine task and hand back its handle.
    ///
    /// An absent cursor means "from now", per the service convention.
    pub(crate) fn spawn(
        url: Url,
        cursor: Option<String>,
        dispatch: Arc<Dispatch>,
        retry: RetryConfig,
        handlers: StreamHandlers<T>,
    ) -> StreamHandle {
        let (state_tx, state_rx) = watch::channel(StreamState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = StreamEngine {
            url,
            cursor: cursor.unwrap_or_else(|| "now".to_string()),
            dispatch,
            retry: RetryState::new(retry),
            handlers,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(engine.run());
        StreamHandle {
            state: state_rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(mut self) {
        loop {
            let url = self.connect_url();
            tracing::debug!(url = %url, cursor = %self.cursor, "opening event stream");

            let connect = tokio::select! {
                _ = self.shutdown.changed() => None,
                result = self.dispatch.get_stream(url) => Some(result),
            };
            let Some(connect) = connect else { break };

            let response = match connect {
                Ok(response) => response,
                Err(error) => {
                    if self.backoff_after(error).await {
                        continue;
                    }
                    return;
                }
            };

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let body = response.text().await.unwrap_or_default();
                match self.retry.should_retry_status(status) {
                    RetryDecision::Retry(delay) => {
                        tracing::warn!(
                            status,
                            attempt = self.retry.attempts,
                            ?delay,
                            "stream connect rejected, reconnecting"
                        );
                        let _ = self.state.send(StreamState::Reconnecting);
                        if !self.pause(delay).await {
                            break;
                        }
                        continue;
                    }
                    RetryDecision::DontRetry => {
                        self.finish(Some(Error::Server { status, body }));
                        return;
                    }
                }
            }

            let _ = self.state.send(StreamState::Open);
            let mut parser = SseParser::new();
            let mut body = response.bytes_stream();

            let disconnect = loop {
                let chunk = tokio::select! {
                    _ = self.shutdown.changed() => None,
                    chunk = body.next() => Some(chunk),
                };
                match chunk {
                    // explicit close while a read was pending
                    None => {
                        self.finish(None);
                        return;
                    }
                    Some(Some(Ok(bytes))) => {
                        for event in parser.feed(&bytes) {
                            self.deliver(event);
                        }
                    }
                    Some(Some(Err(error))) => break Some(Error::from(error)),
                    // orderly end of body: the server closed an idle stream
                    Some(None) => break None,
                }
            };

            match self.retry.should_retry_error() {
                RetryDecision::Retry(delay) => {
                    match &disconnect {
                        Some(error) => tracing::warn!(
                            %error,
                            attempt = self.retry.attempts,
                            ?delay,
                            "stream dropped, reconnecting"
                        ),
                        None => tracing::debug!(?delay, "stream ended, reconnecting"),
                    }
                    let _ = self.state.send(StreamState::Reconnecting);
                    if !self.pause(delay).await {
                        break;
                    }
                }
                RetryDecision::DontRetry => {
                    self.finish(Some(disconnect.unwrap_or(Error::StreamClosed)));
                    return;
                }
            }
        }
        // shutdown requested by the handle
        self.finish(None);
    }

    /// Deliver one parsed event: decode, map, advance the cursor, invoke
    /// the caller. A bad event is reported and skipped; the connection
    /// stays up.
    fn deliver(&mut self, event: SseEvent) {
        if let Some(millis) = event.retry {
            self.retry.set_server_delay(Duration::from_millis(millis));
        }
        if event.data.is_empty() {
            return;
        }

        let value: Value = match serde_json::from_str(&event.data) {
            Ok(value) => value,
            Err(error) => {
                self.emit_error(Error::MalformedResponse(format!(
                    "undecodable event payload: {error}"
                )));
                return;
            }
        };
        // greeting/keep-alive payloads are not records
        if !value.is_object() {
            tracing::debug!("ignoring non-object event payload");
            return;
        }

        let cursor = event.id.clone().or_else(|| {
            value
                .get("paging_token")
                .and_then(Value::as_str)
                .map(String::from)
        });
        let record = match map_record::<T>(value, Arc::clone(&self.dispatch)) {
            Ok(record) => record,
            Err(error) => {
                self.emit_error(error);
                return;
            }
        };

        if let Some(next) = cursor {
            self.observe_cursor(&next);
            self.cursor = next;
        }
        self.retry.reset();
        (self.handlers.on_message)(record);
    }

    /// Cursor order is server-assigned and strictly increasing; a
    /// regression is logged but not enforced against a misbehaving server.
    fn observe_cursor(&self, next: &str) {
        if let (Ok(prev), Ok(next)) = (self.cursor.parse::<u64>(), next.parse::<u64>()) {
            if next <= prev {
                tracing::warn!(prev, next, "server delivered non-monotonic cursor");
            }
        }
    }

    async fn backoff_after(&mut self, error: Error) -> bool {
        match self.retry.should_retry_error() {
            RetryDecision::Retry(delay) => {
                tracing::warn!(
                    %error,
                    attempt = self.retry.attempts,
                    ?delay,
                    "stream connect failed, backing off"
                );
                let _ = self.state.send(StreamState::Reconnecting);
                if self.pause(delay).await {
                    true
                } else {
                    self.finish(None);
                    false
                }
            }
            RetryDecision::DontRetry => {
                self.finish(Some(error));
                false
            }
        }
    }

    /// Sleep unless shutdown arrives first. Returns false on shutdown.
    async fn pause(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.changed() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    fn finish(&self, error: Option<Error>) {
        if let Some(error) = error {
            self.emit_error(error);
        }
        let _ = self.state.send(StreamState::Closed);
    }

    fn emit_error(&self, error: Error) {
        if let Some(on_error) = &self.handlers.on_error {
            on_error(error);
        } else {
            tracing::warn!(%error, "stream error with no on_error handler");
        }
    }

    /// The (re)connect URL: the built query with `cursor` overwritten by
    /// the engine's stored position.
    fn connect_url(&self) -> Url {
        let mut url = self.url.clone();
        let existing: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "cursor")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &existing {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("cursor", &self.cursor);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handlers_debug_hides_callbacks() {
        let handlers: StreamHandlers<Value> = StreamHandlers::new(|_| {});
        let debug = format!("{handlers:?}");
        assert!(debug.contains("has_on_error: false"));
    }

    #[test]
    fn test_stream_state_is_copy_eq() {
        let state = StreamState::Reconnecting;
        let copy = state;
        assert_eq!(state, copy);
        assert_ne!(state, StreamState::Closed);
    }
}
