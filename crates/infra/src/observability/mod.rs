//! Observability infrastructure
//!
//! Structured logging setup plus lightweight sync counters. Counters are
//! plain atomics with a snapshot accessor; there is no exporter here. The
//! host application decides where numbers go.

pub mod metrics;

pub use metrics::{MetricsSnapshot, SyncMetrics};

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Reads `RUST_LOG` for filtering, defaulting to `info`. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
