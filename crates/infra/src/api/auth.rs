//! API authentication port
//!
//! The sync engine does not own credential lifecycle; an external identity
//! collaborator mints short-lived bearer tokens. This module defines the
//! port the coordinator acquires a token through at the start of each cycle.

use async_trait::async_trait;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token
    ///
    /// This method should handle token refresh if needed.
    async fn access_token(&self) -> Result<String, ApiError>;
}

/// Token provider backed by a fixed string.
///
/// Useful for development setups and tests; production wires the identity
/// collaborator's own provider.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ApiError> {
        Ok(self.token.clone())
    }
}
