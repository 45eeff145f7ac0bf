//! Sync-specific error types
//!
//! Provides error classification for sync cycles with retry metadata.

use sitework_domain::SiteworkError;
use thiserror::Error;

use crate::api::ApiError;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// Credential acquisition / 401 / 403 - fatal for the cycle,
    /// re-attempted on the next external trigger
    Authentication,
    /// Server errors (non-2xx, failed function envelope) - retryable
    Server,
    /// Network/connection/timeout/decode errors - retryable
    Transport,
    /// Local store errors - retryable
    Storage,
    /// Configuration errors - non-retryable
    Config,
    /// Superseded or shut down - non-retryable
    Cancelled,
}

/// Sync cycle errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync cycle cancelled")]
    Cancelled,
}

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Auth(_) => SyncErrorCategory::Authentication,
            Self::Server(_) => SyncErrorCategory::Server,
            Self::Transport(_) => SyncErrorCategory::Transport,
            Self::Storage(_) => SyncErrorCategory::Storage,
            Self::Config(_) => SyncErrorCategory::Config,
            Self::Cancelled => SyncErrorCategory::Cancelled,
        }
    }

    /// Check if this error should re-enter the cycle via backoff.
    ///
    /// Authentication failures deliberately do not: waiting does not mint
    /// credentials, and the identity collaborator owns refresh.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            SyncErrorCategory::Server | SyncErrorCategory::Transport | SyncErrorCategory::Storage
        )
    }
}

/// Convert from ApiError to SyncError
impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => Self::Auth(message),
            ApiError::Server { status, body } => {
                Self::Server(format!("status {status}: {body}"))
            }
            ApiError::Network(message) | ApiError::Decode(message) => Self::Transport(message),
            ApiError::Timeout(duration) => Self::Transport(format!("timeout after {duration:?}")),
            ApiError::Config(message) => Self::Config(message),
            ApiError::Cancelled => Self::Cancelled,
        }
    }
}

/// Convert from SiteworkError to SyncError
impl From<SiteworkError> for SyncError {
    fn from(err: SiteworkError) -> Self {
        match err {
            SiteworkError::Storage(message) | SiteworkError::NotFound(message) => {
                Self::Storage(message)
            }
            SiteworkError::Config(message) => Self::Config(message),
            SiteworkError::Network(message) => Self::Transport(message),
            SiteworkError::Auth(message) => Self::Auth(message),
            SiteworkError::InvalidInput(message) | SiteworkError::Internal(message) => {
                Self::Config(message)
            }
        }
    }
}
