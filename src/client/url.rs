//! URL composition for ledger-query requests.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{Error, Result};

/// Composes a base URL with path-filter segments and query parameters.
///
/// The query map is kept sorted, so identical configurations build
/// byte-identical URLs regardless of setter call order. Query writes are
/// last-write-wins.
///
/// At most one filter stack may be active at a time; pushing a second one
/// poisons the builder and [`build`](UrlBuilder::build) fails with a
/// configuration error before anything reaches the network.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    segments: Vec<String>,
    filter: Option<Vec<String>>,
    query: BTreeMap<String, String>,
    defect: Option<String>,
}

impl UrlBuilder {
    pub fn new(base: Url) -> Self {
        UrlBuilder {
            base,
            segments: Vec::new(),
            filter: None,
            query: BTreeMap::new(),
            defect: None,
        }
    }

    /// Append a literal endpoint-identity path component.
    #[must_use]
    pub fn segment(mut self, name: &str) -> Self {
        self.segments.push(name.to_string());
        self
    }

    /// Install the filter stack, e.g. `["accounts", id]`.
    ///
    /// The remote service defines a single resource path per request, so a
    /// second push records a conflict instead of silently replacing the
    /// first.
    #[must_use]
    pub fn push_filter<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if let Some(existing) = &self.filter {
            self.invalidate(format!(
                "conflicting filters: {:?} already set, cannot also filter by {:?}",
                existing, parts
            ));
            return self;
        }
        self.filter = Some(parts);
        self
    }

    /// Set a query parameter, overwriting any previous value for the key.
    #[must_use]
    pub fn set_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Record a configuration defect to be surfaced at build time.
    /// The first defect wins.
    pub(crate) fn invalidate(&mut self, message: String) {
        if self.defect.is_none() {
            self.defect = Some(message);
        }
    }

    /// Build the final URL: base, filter segments, endpoint segments,
    /// sorted query string. Fails fast on any recorded configuration
    /// defect.
    pub fn build(&self) -> Result<Url> {
        if let Some(message) = &self.defect {
            return Err(Error::Config(message.clone()));
        }

        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::Config("base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            if let Some(filter) = &self.filter {
                for part in filter {
                    path.push(part);
                }
            }
            for segment in &self.segments {
                path.push(segment);
            }
        }

        url.set_query(None);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}
