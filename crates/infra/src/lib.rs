//! # Sitework Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - HTTP transport and the remote function-call client
//! - Connectivity monitoring
//! - The sync coordinator
//! - Configuration loading and observability helpers
//!
//! ## Architecture
//! - Implements traits defined in `sitework-core`
//! - Depends on `sitework-domain` and `sitework-core`
//! - Contains all "impure" code (I/O, timers, channels)

pub mod api;
pub mod config;
pub mod http;
pub mod observability;
pub mod sync;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiError, RemoteClient, RemoteClientConfig};
pub use sync::{
    ConnectivityMonitor, SyncCoordinator, SyncCoordinatorConfig, SyncError, SyncReport,
    SyncStatusSnapshot, TriggerOutcome,
};
