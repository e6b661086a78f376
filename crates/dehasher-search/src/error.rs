//! Search error types.
//!
//! Non-success HTTP statuses are classified into a closed set of
//! [`ProviderErrorKind`]s through a single status table.

use thiserror::Error;

/// Kinds of provider-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// 400: the query was rejected as malformed
    BadRequest,
    /// 401: the API key is invalid
    Unauthorized,
    /// 403: insufficient credits or no active API subscription
    Forbidden,
    /// 404: endpoint not found
    NotFound,
    /// 408: the provider timed out
    Timeout,
    /// 429: too many requests
    RateLimited,
    /// 500: provider internal error
    Internal,
    /// 502, 503, 504: provider temporarily unavailable
    Unavailable,
    /// Any other non-success status
    Unknown,
}

impl ProviderErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            500 => Self::Internal,
            502..=504 => Self::Unavailable,
            _ => Self::Unknown,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::BadRequest => "bad request: the search query was rejected",
            Self::Unauthorized => "unauthorized: the API key is invalid",
            Self::Forbidden => "forbidden: insufficient credits or no active API subscription",
            Self::NotFound => "not found: the search endpoint does not exist",
            Self::Timeout => "the provider timed out processing the request",
            Self::RateLimited => "rate limited: too many requests",
            Self::Internal => "the provider reported an internal server error",
            Self::Unavailable => "the provider is temporarily unavailable",
            Self::Unknown => "unexpected response from the provider",
        }
    }
}

/// A non-success response from the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {status})")]
pub struct ProviderError {
    /// Classified kind
    pub kind: ProviderErrorKind,
    /// HTTP status code
    pub status: u16,
    /// Human-readable message
    pub message: String,
}

impl ProviderError {
    /// Build the error for an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        let kind = ProviderErrorKind::from_status(status);
        Self {
            kind,
            status,
            message: kind.message().to_string(),
        }
    }
}

/// Errors produced by the search engine.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The HTTP request could not be issued or its body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The success envelope could not be decoded.
    #[error("failed to decode provider response: {source}")]
    Decode {
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// No API key is configured.
    #[error("API key is required. Set the key with the \"set-key\" command.")]
    MissingApiKey,

    /// No search predicates were given.
    #[error("no search predicates given; provide at least one field to search")]
    EmptyQuery,

    /// The run configuration is invalid.
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (confirmation prompt, terminal output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// True for errors raised by a fetch call (transport, provider, decode).
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Provider(_) | Self::Decode { .. }
        )
    }
}

impl From<SearchError> for dehasher_core::DehasherError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Io(e) => Self::Io(e),
            e @ (SearchError::EmptyQuery | SearchError::InvalidConfig(_)) => {
                Self::Validation(e.to_string())
            }
            other => Self::Network(other.to_string()),
        }
    }
}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let table = [
            (400, ProviderErrorKind::BadRequest),
            (401, ProviderErrorKind::Unauthorized),
            (403, ProviderErrorKind::Forbidden),
            (404, ProviderErrorKind::NotFound),
            (408, ProviderErrorKind::Timeout),
            (429, ProviderErrorKind::RateLimited),
            (500, ProviderErrorKind::Internal),
            (502, ProviderErrorKind::Unavailable),
            (503, ProviderErrorKind::Unavailable),
            (504, ProviderErrorKind::Unavailable),
            (418, ProviderErrorKind::Unknown),
            (302, ProviderErrorKind::Unknown),
        ];
        for (status, kind) in table {
            assert_eq!(ProviderErrorKind::from_status(status), kind, "status {status}");
        }
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::from_status(429);
        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert_eq!(err.to_string(), "rate limited: too many requests (code 429)");
    }

    #[test]
    fn test_missing_key_message() {
        assert_eq!(
            SearchError::MissingApiKey.to_string(),
            "API key is required. Set the key with the \"set-key\" command."
        );
    }

    #[test]
    fn test_fetch_error_classification() {
        assert!(SearchError::Provider(ProviderError::from_status(500)).is_fetch_error());
        assert!(!SearchError::EmptyQuery.is_fetch_error());
    }
}
