//! Fetch error type carrying its retry classification.

use super::classify::{classify_curl_error, classify_http_status};
use super::policy::ErrorKind;
use crate::url_model::ResolveError;

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Non-2xx response.
    pub fn http(code: u32) -> Self {
        Self::new(classify_http_status(code), format!("HTTP {}", code))
    }

    pub fn storage(err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Storage, format!("storage: {}", err))
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        Self::new(classify_curl_error(&e), e.to_string())
    }
}

impl From<ResolveError> for FetchError {
    fn from(e: ResolveError) -> Self {
        Self::new(ErrorKind::InvalidUrl, e.to_string())
    }
}
