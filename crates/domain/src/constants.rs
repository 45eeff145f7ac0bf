//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Sync retry configuration
pub const MAX_SYNC_RETRIES: u32 = 5;
pub const BACKOFF_BASE_SECS: u64 = 1;

// Remote call defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BASE_URL: &str = "https://api.sitework.app";

// Wire format
pub const WIRE_FORMAT_JSON: &str = "json";

// Error reporting
pub const MAX_ERROR_MESSAGE_LEN: usize = 256;
pub const ERROR_TRUNCATE_SUFFIX: &str = "...";
