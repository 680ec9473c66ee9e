//! Response mapping: raw JSON into typed, link-navigable records and pages.
//!
//! Mapping is a pure function of its input — no network access happens
//! during mapping itself. Network access happens only when a produced link
//! function ([`Record::follow`]) or page navigation ([`Page::next`],
//! [`Page::prev`]) is invoked.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::client::http::Dispatch;
use crate::error::{Error, Result};

/// One hyperlink from a response's `_links` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub templated: bool,
}

/// Named hyperlinks attached to a record.
#[derive(Debug, Clone, Default)]
pub struct Links {
    inner: BTreeMap<String, Link>,
}

impl Links {
    fn from_value(value: &Value) -> Self {
        let mut inner = BTreeMap::new();
        if let Some(map) = value.as_object() {
            for (name, entry) in map {
                if let Some(href) = entry.get("href").and_then(Value::as_str) {
                    inner.insert(
                        name.clone(),
                        Link {
                            href: href.to_string(),
                            templated: entry
                                .get("templated")
                                .and_then(Value::as_bool)
                                .unwrap_or(false),
                        },
                    );
                }
            }
        }
        Links { inner }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Link> {
        self.inner.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// A decoded resource plus the capability to follow its hyperlinks.
///
/// The record owns its link capability — it closes over the shared request
/// executor, not the builder that produced it, so it stays usable after the
/// builder is gone.
#[derive(Clone)]
pub struct Record<T> {
    data: T,
    links: Links,
    dispatch: Arc<Dispatch>,
}

impl<T> Record<T> {
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    #[must_use]
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Follow a named link, mapping the response by the same rule that
    /// produced this record.
    pub async fn follow<U: DeserializeOwned>(&self, name: &str) -> Result<CallResponse<U>> {
        self.follow_with(name, &[]).await
    }

    /// Follow a named link, expanding a templated href with the given
    /// parameters. Template variables without a supplied value expand to
    /// nothing.
    pub async fn follow_with<U: DeserializeOwned>(
        &self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<CallResponse<U>> {
        let link = self
            .links
            .get(name)
            .ok_or_else(|| Error::MissingLink(name.to_string()))?;
        let url = resolve_href(&link.href, link.templated, params)?;
        let value = self.dispatch.get_json(url).await?;
        map_response(value, Arc::clone(&self.dispatch))
    }
}

impl<T: fmt::Debug> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("data", &self.data)
            .field("links", &self.links)
            .finish()
    }
}

/// One batch of records plus forward/backward navigation.
///
/// Navigation is link-driven: `next()`/`prev()` always GET the exact href
/// the server returned, never a client-reconstructed URL, so server-side
/// continuation state baked into the link survives.
#[derive(Clone)]
pub struct Page<T> {
    records: Vec<Record<T>>,
    next: Option<String>,
    prev: Option<String>,
    dispatch: Arc<Dispatch>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn records(&self) -> &[Record<T>] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record<T>> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn next_href(&self) -> Option<&str> {
        self.next.as_deref()
    }

    #[must_use]
    pub fn prev_href(&self) -> Option<&str> {
        self.prev.as_deref()
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Fetch the following page, or `None` if the server supplied no
    /// `next` link.
    pub async fn next(&self) -> Result<Option<Page<T>>> {
        self.turn(self.next.as_deref()).await
    }

    /// Fetch the preceding page, or `None` if the server supplied no
    /// `prev` link.
    pub async fn prev(&self) -> Result<Option<Page<T>>> {
        self.turn(self.prev.as_deref()).await
    }

    async fn turn(&self, href: Option<&str>) -> Result<Option<Page<T>>> {
        let Some(href) = href else {
            return Ok(None);
        };
        let url = Url::parse(href)
            .map_err(|e| Error::MalformedResponse(format!("unusable paging href {href:?}: {e}")))?;
        let value = self.dispatch.get_json(url).await?;
        map_page(value, Arc::clone(&self.dispatch)).map(Some)
    }
}

impl<T: fmt::Debug> fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("records", &self.records)
            .field("next", &self.next)
            .field("prev", &self.prev)
            .finish()
    }
}

/// What a one-shot call resolved to: a single resource or a collection.
#[derive(Debug)]
pub enum CallResponse<T> {
    One(Record<T>),
    Page(Page<T>),
}

impl<T> CallResponse<T> {
    pub fn into_record(self) -> Result<Record<T>> {
        match self {
            CallResponse::One(record) => Ok(record),
            CallResponse::Page(_) => Err(Error::MalformedResponse(
                "expected a single resource, got a collection envelope".to_string(),
            )),
        }
    }

    pub fn into_page(self) -> Result<Page<T>> {
        match self {
            CallResponse::Page(page) => Ok(page),
            CallResponse::One(_) => Err(Error::MalformedResponse(
                "expected a collection envelope, got a single resource".to_string(),
            )),
        }
    }
}

/// Map one raw resource object into a typed record.
///
/// Absent `_links` yields an empty link set; stream event payloads may
/// legitimately omit it.
pub(crate) fn map_record<T: DeserializeOwned>(
    value: Value,
    dispatch: Arc<Dispatch>,
) -> Result<Record<T>> {
    let links = value.get("_links").map(Links::from_value).unwrap_or_default();
    let data = serde_json::from_value(value)?;
    Ok(Record {
        data,
        links,
        dispatch,
    })
}

/// Map a collection envelope into a page.
pub(crate) fn map_page<T: DeserializeOwned>(
    value: Value,
    dispatch: Arc<Dispatch>,
) -> Result<Page<T>> {
    let envelope_links = value
        .get("_links")
        .ok_or_else(|| Error::MalformedResponse("collection envelope is missing _links".to_string()))?;
    let href_of = |name: &str| {
        envelope_links
            .get(name)
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
            .map(String::from)
    };
    let next = href_of("next");
    let prev = href_of("prev");

    let raw_records = value
        .get("_embedded")
        .and_then(|embedded| embedded.get("records"))
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| {
            Error::MalformedResponse("collection envelope is missing _embedded.records".to_string())
        })?;

    let mut records = Vec::with_capacity(raw_records.len());
    for raw in raw_records {
        records.push(map_record(raw, Arc::clone(&dispatch))?);
    }
    Ok(Page {
        records,
        next,
        prev,
        dispatch,
    })
}

/// Map a response body by shape: a collection envelope becomes a page,
/// anything else a single record.
pub(crate) fn map_response<T: DeserializeOwned>(
    value: Value,
    dispatch: Arc<Dispatch>,
) -> Result<CallResponse<T>> {
    let is_collection = value
        .get("_embedded")
        .and_then(|embedded| embedded.get("records"))
        .is_some();
    if is_collection {
        map_page(value, dispatch).map(CallResponse::Page)
    } else {
        map_record(value, dispatch).map(CallResponse::One)
    }
}

pub(crate) fn resolve_href(href: &str, templated: bool, params: &[(&str, &str)]) -> Result<Url> {
    let resolved = if templated {
        expand_template(href, params)
    } else {
        href.to_string()
    };
    Url::parse(&resolved)
        .map_err(|e| Error::MalformedResponse(format!("unusable link href {href:?}: {e}")))
}

/// Expand the template subset servers use in link hrefs: `{var}`,
/// `{?a,b,c}`, and `{&a,b}` expressions. Variables without a supplied
/// value expand to nothing.
fn expand_template(href: &str, params: &[(&str, &str)]) -> String {
    let lookup = |name: &str| {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    };

    let mut out = String::with_capacity(href.len());
    let mut rest = href;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let expr = &rest[start + 1..start + end];
        rest = &rest[start + end + 1..];

        let (operator, names) = match expr.as_bytes().first() {
            Some(b'?') => (Some('?'), &expr[1..]),
            Some(b'&') => (Some('&'), &expr[1..]),
            _ => (None, expr),
        };
        match operator {
            Some(first) => {
                let mut separator = first;
                for name in names.split(',') {
                    if let Some(value) = lookup(name) {
                        out.push(separator);
                        out.push_str(name);
                        out.push('=');
                        out.push_str(value);
                        separator = '&';
                    }
                }
            }
            None => {
                if let Some(value) = lookup(names) {
                    out.push_str(value);
                }
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn dispatch() -> Arc<Dispatch> {
        Arc::new(Dispatch::new(
            reqwest::Client::new(),
            Duration::from_secs(5),
        ))
    }

    fn operation(token: &str) -> Value {
        json!({
            "_links": {
                "self": {"href": format!("https://q.example.org/operations/{token}")},
                "transaction": {"href": "https://q.example.org/transactions/abc"},
                "effects": {
                    "href": format!("https://q.example.org/operations/{token}/effects{{?cursor,limit,order}}"),
                    "templated": true
                }
            },
            "id": token,
            "paging_token": token,
            "type": "payment",
            "source_account": "GABC",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    fn envelope() -> Value {
        json!({
            "_links": {
                "self": {"href": "https://q.example.org/operations?limit=2"},
                "next": {"href": "https://q.example.org/operations?cursor=101&limit=2"},
                "prev": {"href": "https://q.example.org/operations?cursor=100&limit=2&order=desc"}
            },
            "_embedded": {
                "records": [operation("100"), operation("101")]
            }
        })
    }

    #[test]
    fn test_map_record_extracts_links() {
        let record: Record<Value> = map_record(operation("100"), dispatch()).unwrap();
        assert_eq!(record.links().len(), 3);
        assert!(record.links().get("transaction").is_some());
        assert!(record.links().get("effects").unwrap().templated);
        assert_eq!(record.data()["paging_token"], "100");
    }

    #[test]
    fn test_map_record_without_links_is_lenient() {
        let record: Record<Value> =
            map_record(json!({"paging_token": "1"}), dispatch()).unwrap();
        assert!(record.links().is_empty());
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let a: Record<Value> = map_record(operation("100"), dispatch()).unwrap();
        let b: Record<Value> = map_record(operation("100"), dispatch()).unwrap();
        assert_eq!(a.data(), b.data());
        assert_eq!(
            a.links().get("self").unwrap().href,
            b.links().get("self").unwrap().href
        );
    }

    #[test]
    fn test_map_page() {
        let page: Page<Value> = map_page(envelope(), dispatch()).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(
            page.next_href(),
            Some("https://q.example.org/operations?cursor=101&limit=2")
        );
        assert!(page.prev_href().is_some());
    }

    #[test]
    fn test_map_page_missing_records_is_malformed() {
        let err = map_page::<Value>(json!({"_links": {}}), dispatch()).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(err.to_string().contains("_embedded.records"));
    }

    #[test]
    fn test_map_page_missing_links_is_malformed() {
        let raw = json!({"_embedded": {"records": []}});
        let err = map_page::<Value>(raw, dispatch()).unwrap_err();
        assert!(err.to_string().contains("_links"));
    }

    #[test]
    fn test_map_response_detects_shape() {
        let one: CallResponse<Value> = map_response(operation("7"), dispatch()).unwrap();
        assert!(matches!(one, CallResponse::One(_)));
        let many: CallResponse<Value> = map_response(envelope(), dispatch()).unwrap();
        assert!(matches!(many, CallResponse::Page(_)));
    }

    #[test]
    fn test_into_record_mismatch() {
        let many: CallResponse<Value> = map_response(envelope(), dispatch()).unwrap();
        assert!(many.into_record().is_err());
    }

    #[test]
    fn test_follow_unknown_link_is_missing_link() {
        let record: Record<Value> = map_record(operation("100"), dispatch()).unwrap();
        let err = futures::executor::block_on(record.follow::<Value>("nope")).unwrap_err();
        assert!(matches!(err, Error::MissingLink(_)));
    }

    #[test]
    fn test_expand_template_drops_unfilled_query() {
        let out = expand_template(
            "https://q.example.org/operations/1/effects{?cursor,limit,order}",
            &[],
        );
        assert_eq!(out, "https://q.example.org/operations/1/effects");
    }

    #[test]
    fn test_expand_template_fills_supplied_params() {
        let out = expand_template(
            "https://q.example.org/effects{?cursor,limit}",
            &[("limit", "10")],
        );
        assert_eq!(out, "https://q.example.org/effects?limit=10");
    }

    #[test]
    fn test_expand_template_simple_variable() {
        let out = expand_template(
            "https://q.example.org/accounts/{account_id}",
            &[("account_id", "GABC")],
        );
        assert_eq!(out, "https://q.example.org/accounts/GABC");
    }

    #[test]
    fn test_resolve_untemplated_href_verbatim() {
        let url = resolve_href(
            "https://q.example.org/operations?cursor=100",
            false,
            &[("cursor", "999")],
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://q.example.org/operations?cursor=100");
    }
}
