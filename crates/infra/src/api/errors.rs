//! API-specific error types
//!
//! Provides error classification for remote calls with retry metadata.

use std::time::Duration;

use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403) - fatal for the current cycle,
    /// re-attempted on the next external trigger
    Authentication,
    /// Server-reported errors (non-2xx, failed function envelope) - retryable
    Server,
    /// Transport errors (connection, timeout, malformed response) - retryable
    Transport,
    /// Request construction / configuration errors - non-retryable
    Config,
}

/// Remote call errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Network(_) | Self::Decode(_) | Self::Timeout(_) => ApiErrorCategory::Transport,
            Self::Config(_) | Self::Cancelled => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried with backoff
    pub fn should_retry(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Server | ApiErrorCategory::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            ApiError::Auth("test".to_string()).category(),
            ApiErrorCategory::Authentication
        );
        assert_eq!(
            ApiError::Server { status: 500, body: "boom".to_string() }.category(),
            ApiErrorCategory::Server
        );
        assert_eq!(ApiError::Network("test".to_string()).category(), ApiErrorCategory::Transport);
        assert_eq!(
            ApiError::Decode("bad json".to_string()).category(),
            ApiErrorCategory::Transport
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(30)).category(),
            ApiErrorCategory::Transport
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(ApiError::Server { status: 503, body: String::new() }.should_retry());
        assert!(ApiError::Network("test".to_string()).should_retry());
        assert!(ApiError::Timeout(Duration::from_secs(5)).should_retry());
        assert!(!ApiError::Auth("test".to_string()).should_retry());
        assert!(!ApiError::Config("test".to_string()).should_retry());
        assert!(!ApiError::Cancelled.should_retry());
    }
}
