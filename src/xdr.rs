//! Seam for the external XDR decoder.
//!
//! Certain response fields (those ending in `_xdr`) are base64-encoded
//! binary blobs. The client exposes them untouched — the target structured
//! type is ambiguous from the field name alone, so decoding is left to an
//! external codec supplied by the caller.

use serde_json::Value;

use crate::error::Result;

/// An undecoded base64 blob lifted verbatim from a response field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob(String);

impl Blob {
    pub fn new(encoded: impl Into<String>) -> Self {
        Blob(encoded.into())
    }

    /// The base64 text exactly as the server sent it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Blob {
    fn from(encoded: String) -> Self {
        Blob(encoded)
    }
}

impl std::fmt::Display for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// External decoder: blob in, structured value out.
///
/// Implemented by the caller with their wire-format codec; the client never
/// invokes it on its own.
pub trait Decode {
    fn decode(&self, blob: &Blob) -> Result<Value>;
}
