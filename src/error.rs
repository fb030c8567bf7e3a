use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by a snapshot data source.
///
/// Read timeouts get their own variant so the caller's retry policy can
/// target them; everything else fails the cycle immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error {status}: {preview}")]
    Status { status: StatusCode, preview: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Non-JSON response: {0}")]
    NonJsonResponse(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }

    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status,
                preview: err.to_string(),
            }
        } else {
            FetchError::Request(err.to_string())
        }
    }
}
