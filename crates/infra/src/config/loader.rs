//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the environment names no base URL, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Falls back to built-in defaults when neither source exists
//!
//! ## Environment Variables
//! - `SITEWORK_API_BASE_URL`: Backend base URL (marks the env as configured)
//! - `SITEWORK_API_TIMEOUT_SECS`: Per-call timeout in seconds
//! - `SITEWORK_SYNC_MAX_RETRIES`: Retry bound for a sync cycle
//! - `SITEWORK_SYNC_BACKOFF_BASE_SECS`: Base delay for exponential backoff
//! - `SITEWORK_DEVICE_NAME`: Device name sent during identity registration
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./sitework.toml` (current working directory)
//! 2. `./config.toml` (current working directory)
//! 3. `../sitework.toml` (parent directory)

use std::path::{Path, PathBuf};

use sitework_domain::{Config, Result, SiteworkError};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `SiteworkError::Config` if a present source cannot be parsed.
pub fn load() -> Result<Config> {
    // Pick up a local .env in development setups; ignored when absent.
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(Some(config)) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Ok(None) => match probe_config_file() {
            Some(path) => load_from_file(&path),
            None => {
                tracing::debug!("No configuration source found; using defaults");
                Ok(Config::default())
            }
        },
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// Returns `Ok(None)` when `SITEWORK_API_BASE_URL` is unset, signalling
/// that the environment does not carry a configuration.
///
/// # Errors
/// Returns `SiteworkError::Config` when a variable is present but invalid.
pub fn load_from_env() -> Result<Option<Config>> {
    let Some(base_url) = std::env::var("SITEWORK_API_BASE_URL").ok() else {
        return Ok(None);
    };

    let mut config = Config::default();
    config.api.base_url = base_url;

    if let Some(timeout) = env_u64("SITEWORK_API_TIMEOUT_SECS")? {
        config.api.request_timeout_secs = timeout;
    }
    if let Some(max_retries) = env_u64("SITEWORK_SYNC_MAX_RETRIES")? {
        config.sync.max_retries = u32::try_from(max_retries)
            .map_err(|_| SiteworkError::Config("Retry bound out of range".into()))?;
    }
    if let Some(backoff) = env_u64("SITEWORK_SYNC_BACKOFF_BASE_SECS")? {
        config.sync.backoff_base_secs = backoff;
    }
    if let Ok(name) = std::env::var("SITEWORK_DEVICE_NAME") {
        config.sync.device_name = Some(name);
    }

    Ok(Some(config))
}

/// Load configuration from a TOML file
///
/// # Errors
/// Returns `SiteworkError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SiteworkError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;

    let config = toml::from_str(&contents).map_err(|e| {
        SiteworkError::Config(format!("Failed to parse {}: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_config_file() -> Option<PathBuf> {
    const CANDIDATES: [&str; 3] = ["sitework.toml", "config.toml", "../sitework.toml"];

    CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| SiteworkError::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
