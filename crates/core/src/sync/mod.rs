//! Sync ports and reconciliation rules

pub mod ports;
pub mod reconcile;

pub use ports::RecordStore;
pub use reconcile::{plan_pull, PullAction};
