//! Configuration structures
//!
//! Plain data loaded by the infra config loader from environment variables
//! or a TOML file. All fields have serde defaults so partial files work.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BACKOFF_BASE_SECS, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_SYNC_RETRIES,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the backend (e.g., "https://api.sitework.app")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for a single remote call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Sync engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Maximum retries before a cycle surfaces its error
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff, in seconds
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    /// Human-readable device name sent during identity registration
    #[serde(default)]
    pub device_name: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            device_name: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    MAX_SYNC_RETRIES
}

fn default_backoff_base_secs() -> u64 {
    BACKOFF_BASE_SECS
}
