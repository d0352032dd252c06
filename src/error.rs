use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single scheduled upstream fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Upstream unreachable, connection reset, client-side timeout
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body was not JSON, or did not have the expected shape
    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// HTTP status reported by the upstream, if it got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the access token in their query string
        let err = err.without_url();
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Failure of the request-scoped news proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("news provider is not configured (NEWS_API_KEY missing)")]
    NotConfigured,

    #[error("news request failed: {0}")]
    Transport(reqwest::Error),

    #[error("news provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid news provider URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        // The news URL carries the API key
        ProxyError::Transport(err.without_url())
    }
}

/// Last refresh failure as stored in a cache slot and surfaced by `/api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub at: DateTime<Utc>,
}

impl From<&FetchError> for ErrorInfo {
    fn from(err: &FetchError) -> Self {
        ErrorInfo {
            message: err.to_string(),
            status: err.status(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_status_variant() {
        let err = FetchError::Status {
            status: 429,
            message: "Too Many Requests".into(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(FetchError::Transport("refused".into()).status(), None);
        assert_eq!(FetchError::Malformed("eof".into()).status(), None);
    }

    #[test]
    fn test_error_info_from_fetch_error() {
        let err = FetchError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        let info = ErrorInfo::from(&err);
        assert_eq!(info.status, Some(503));
        assert_eq!(info.message, "upstream returned 503: unavailable");
    }
}
