use std::fmt;
use thiserror::Error;

/// Failure reported by a remote highlight endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. `message` comes from the `{ message }` body when present.
    #[error("{status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx response with `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// Connection or protocol failure. The request URL is stripped on conversion.
    #[error("network failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.without_url())
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote quota exceeded; the user has to wait.
    RateLimited,
    NotFound,
    /// Anything else; retrying is fine.
    Generic,
}

const RATE_LIMIT_MARKERS: [&str; 5] = [
    "429",
    "too many requests",
    "rate limit",
    "quota",
    "exceeded your",
];

/// Only text supplied by the server is searched for rate-limit language;
/// local failures are classified by status code or treated as generic.
pub fn classify(error: &ApiError) -> ErrorKind {
    match error {
        ApiError::Http { status: 429, .. } => ErrorKind::RateLimited,
        ApiError::Http { status: 404, .. } => ErrorKind::NotFound,
        ApiError::Http { message, .. } | ApiError::Rejected(message) => classify_message(message),
        ApiError::Transport(e) => match e.status().map(|s| s.as_u16()) {
            Some(429) => ErrorKind::RateLimited,
            Some(404) => ErrorKind::NotFound,
            _ => ErrorKind::Generic,
        },
        ApiError::Decode(_) | ApiError::InvalidUrl(_) => ErrorKind::Generic,
    }
}

/// Classify a server-supplied message.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorKind::RateLimited
    } else if lower.contains("404") || lower.contains("not found") {
        ErrorKind::NotFound
    } else {
        ErrorKind::Generic
    }
}

/// Visible per-match discovery error. `Display` renders the user-facing copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryError {
    pub kind: ErrorKind,
    /// Raw failure text from the boundary, kept for logs and diagnostics.
    pub detail: String,
}

impl DiscoveryError {
    pub fn from_api(error: &ApiError) -> Self {
        Self {
            kind: classify(error),
            detail: error.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind != ErrorKind::RateLimited
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::RateLimited => write!(
                f,
                "Highlight search is busy right now. Wait a minute, then open matches one at a time."
            ),
            ErrorKind::NotFound => write!(f, "This match is not known to the highlight service."),
            ErrorKind::Generic => write!(f, "Failed to discover highlights: {}", self.detail),
        }
    }
}
