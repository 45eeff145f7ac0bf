//! Sync counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for sync activity.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    cycles_started: AtomicU64,
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    retries: AtomicU64,
    records_uploaded: AtomicU64,
    upload_failures: AtomicU64,
    records_downloaded: AtomicU64,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub retries: u64,
    pub records_uploaded: u64,
    pub upload_failures: u64,
    pub records_downloaded: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_cycles_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cycles_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_cycles_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_records_uploaded(&self) {
        self.records_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_upload_failures(&self) {
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_records_downloaded(&self) {
        self.records_downloaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy out all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            records_uploaded: self.records_uploaded.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            records_downloaded: self.records_downloaded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = SyncMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_started, 0);
        assert_eq!(snapshot.records_uploaded, 0);
    }

    #[test]
    fn increments_are_visible_in_snapshots() {
        let metrics = SyncMetrics::new();
        metrics.incr_cycles_started();
        metrics.incr_records_uploaded();
        metrics.incr_records_uploaded();
        metrics.incr_retries();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_started, 1);
        assert_eq!(snapshot.records_uploaded, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.cycles_failed, 0);
    }
}
