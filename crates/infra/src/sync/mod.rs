//! Sync engine for Sitework
//!
//! This module reconciles the local store with the multi-device backend:
//! - ConnectivityMonitor: edge-triggered "connectivity restored" signal
//! - SyncCoordinator: bidirectional sync cycles with retry scheduling
//! - Backoff: the exponential wait policy between failed cycles
//!
//! Lifecycle management is explicit: join handles are tracked, cancellation
//! tokens thread through every suspension point, and dropping a running
//! coordinator cancels its tasks.

pub mod backoff;
pub mod connectivity;
pub mod coordinator;
mod errors;

pub use backoff::Backoff;
pub use connectivity::ConnectivityMonitor;
pub use coordinator::{
    RecordTransport, SyncCoordinator, SyncCoordinatorConfig, SyncReport, SyncStatusSnapshot,
    TriggerOutcome, UploadOutcome,
};
pub use errors::{SyncError, SyncErrorCategory};
