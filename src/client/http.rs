//! Shared request executor.
//!
//! A thin handle over the HTTP client that records, pages, and stream
//! engines share. Link functions close over this handle rather than the
//! builder that produced them, so a record can outlive its builder.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug)]
pub(crate) struct Dispatch {
    http: reqwest::Client,
    request_timeout: Duration,
}

impl Dispatch {
    pub(crate) fn new(http: reqwest::Client, request_timeout: Duration) -> Self {
        Dispatch {
            http,
            request_timeout,
        }
    }

    /// Issue exactly one GET and parse the JSON body.
    ///
    /// Non-2xx statuses surface as [`Error::Server`] carrying the problem
    /// body verbatim.
    pub(crate) async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        if !(200..300).contains(&status) {
            return Err(Error::Server {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Open a long-lived server-push connection.
    ///
    /// No per-request timeout here: the read side of a healthy stream stays
    /// open indefinitely and is bounded by the reconnect policy instead.
    pub(crate) async fn get_stream(&self, url: Url) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        Ok(response)
    }
}
