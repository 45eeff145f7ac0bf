//! Sync coordinator
//!
//! Drives bidirectional sync cycles between the local store and the
//! backend: upload every Pending record of every entity type, then, only
//! after all uploads, download remote changes per type and reconcile them
//! with last-write-wins. Owns retry scheduling (exponential backoff,
//! cancellable by a fresh trigger) and guarantees single-flight execution.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sitework_infra::api::{RemoteClient, RemoteClientConfig, StaticTokenProvider};
//! use sitework_infra::observability::SyncMetrics;
//! use sitework_infra::sync::{ConnectivityMonitor, SyncCoordinator, SyncCoordinatorConfig};
//!
//! # async fn example(store: Arc<dyn sitework_core::RecordStore>) -> Result<(), String> {
//! let client = RemoteClient::new(RemoteClientConfig::default()).map_err(|e| e.to_string())?;
//! let monitor = Arc::new(ConnectivityMonitor::new());
//!
//! let coordinator = SyncCoordinator::new(
//!     store,
//!     Arc::new(client),
//!     Arc::new(StaticTokenProvider::new("dev-token")),
//!     Arc::clone(&monitor),
//!     SyncCoordinatorConfig::default(),
//!     Arc::new(SyncMetrics::new()),
//! );
//!
//! coordinator.start().map_err(|e| e.to_string())?;
//! monitor.report(true); // first restoration edge triggers a sync
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sitework_core::{plan_pull, PullAction, RecordStore};
use sitework_domain::constants::{
    BACKOFF_BASE_SECS, ERROR_TRUNCATE_SUFFIX, MAX_ERROR_MESSAGE_LEN, MAX_SYNC_RETRIES,
};
use sitework_domain::{EntityKind, RemoteRecord, SyncRecord, SyncSettings};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::api::{AccessTokenProvider, ApiError, ApiErrorCategory, RemoteClient};
use crate::observability::SyncMetrics;
use crate::sync::backoff::Backoff;
use crate::sync::connectivity::ConnectivityMonitor;
use crate::sync::errors::SyncError;

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncCoordinatorConfig {
    /// Maximum retries before a cycle surfaces its error
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub backoff_base: Duration,
    /// Entity types downloaded during the pull phase
    pub pull_kinds: Vec<EntityKind>,
    /// Human-readable device name sent during identity registration
    pub device_name: Option<String>,
    /// Join timeout when shutting down
    pub join_timeout: Duration,
}

impl Default for SyncCoordinatorConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_SYNC_RETRIES,
            backoff_base: Duration::from_secs(BACKOFF_BASE_SECS),
            pull_kinds: EntityKind::ALL.to_vec(),
            device_name: None,
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&SyncSettings> for SyncCoordinatorConfig {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff_base: Duration::from_secs(settings.backoff_base_secs),
            device_name: settings.device_name.clone(),
            ..Self::default()
        }
    }
}

/// Observable sync state for the UI collaborator.
#[derive(Debug, Clone, Default)]
pub struct SyncStatusSnapshot {
    pub is_syncing: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub pending_changes: usize,
    pub last_error: Option<String>,
}

/// What a `trigger_sync` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A fresh cycle was started
    Started,
    /// A cycle is already active; the call was a no-op
    AlreadyRunning,
    /// The device is offline; the call was a no-op
    Offline,
}

/// Result of uploading one record.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub entity: EntityKind,
    pub local_id: String,
    /// Truncated failure reason; `None` on success
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-cycle report: one entry per uploaded record plus download counts.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub uploads: Vec<UploadOutcome>,
    pub downloaded: usize,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.uploads.iter().filter(|o| o.succeeded()).count()
    }

    pub fn upload_failures(&self) -> usize {
        self.uploads.len() - self.uploaded()
    }
}

/// Interface for pushing and pulling records over the wire.
///
/// Implemented by [`RemoteClient`]; tests substitute scripted transports.
#[async_trait]
pub trait RecordTransport: Send + Sync {
    /// Upsert one record keyed by its local id; must be idempotent.
    async fn upsert(&self, record: &SyncRecord, token: &str) -> Result<RemoteRecord, ApiError>;

    /// List records of one kind changed at or after `since_ms`.
    async fn list_since(
        &self,
        entity: EntityKind,
        since_ms: i64,
        token: &str,
    ) -> Result<Vec<RemoteRecord>, ApiError>;

    /// Register this device with the identity backend.
    async fn register_identity(
        &self,
        device_id: &str,
        device_name: Option<&str>,
        token: &str,
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl RecordTransport for RemoteClient {
    async fn upsert(&self, record: &SyncRecord, token: &str) -> Result<RemoteRecord, ApiError> {
        self.upsert_record(record, token).await
    }

    async fn list_since(
        &self,
        entity: EntityKind,
        since_ms: i64,
        token: &str,
    ) -> Result<Vec<RemoteRecord>, ApiError> {
        RemoteClient::list_since(self, entity, since_ms, token).await
    }

    async fn register_identity(
        &self,
        device_id: &str,
        device_name: Option<&str>,
        token: &str,
    ) -> Result<(), ApiError> {
        RemoteClient::register_identity(self, device_id, device_name, token).await
    }
}

/// Shared mutable state behind the coordinator.
struct CoordinatorState {
    /// Single-flight flag; held while a cycle is actively working (not
    /// while it is parked in a backoff wait)
    in_flight: AtomicBool,
    retry_count: AtomicU32,
    registered: AtomicBool,
    pending_changes: AtomicUsize,
    last_sync_at: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
    last_report: Mutex<Option<SyncReport>>,
    /// Token of the current cycle; replaced on every accepted trigger so a
    /// superseded cycle's backoff wait can be interrupted
    cycle_cancel: Mutex<CancellationToken>,
    status_tx: watch::Sender<SyncStatusSnapshot>,
}

impl CoordinatorState {
    fn publish(&self, is_syncing: bool) {
        let snapshot = SyncStatusSnapshot {
            is_syncing,
            last_sync_at: *self.last_sync_at.lock(),
            pending_changes: self.pending_changes.load(Ordering::SeqCst),
            last_error: self.last_error.lock().clone(),
        };
        self.status_tx.send_replace(snapshot);
    }
}

/// Everything a running cycle needs, cloneable into spawned tasks.
#[derive(Clone)]
struct CycleContext {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn RecordTransport>,
    auth: Arc<dyn AccessTokenProvider>,
    monitor: Arc<ConnectivityMonitor>,
    config: SyncCoordinatorConfig,
    backoff: Backoff,
    metrics: Arc<SyncMetrics>,
    device_id: String,
    state: Arc<CoordinatorState>,
}

/// Coordinates sync cycles with retry scheduling and single-flight
/// execution.
pub struct SyncCoordinator {
    context: CycleContext,
    bridge_cancel: CancellationToken,
    bridge_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncCoordinator {
    /// Create a new coordinator.
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn RecordTransport>,
        auth: Arc<dyn AccessTokenProvider>,
        monitor: Arc<ConnectivityMonitor>,
        config: SyncCoordinatorConfig,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatusSnapshot::default());
        let backoff = Backoff::new(config.backoff_base, config.max_retries);

        let context = CycleContext {
            store,
            transport,
            auth,
            monitor,
            config,
            backoff,
            metrics,
            device_id: Uuid::now_v7().to_string(),
            state: Arc::new(CoordinatorState {
                in_flight: AtomicBool::new(false),
                retry_count: AtomicU32::new(0),
                registered: AtomicBool::new(false),
                pending_changes: AtomicUsize::new(0),
                last_sync_at: Mutex::new(None),
                last_error: Mutex::new(None),
                last_report: Mutex::new(None),
                cycle_cancel: Mutex::new(CancellationToken::new()),
                status_tx,
            }),
        };

        Self { context, bridge_cancel: CancellationToken::new(), bridge_handle: Mutex::new(None) }
    }

    /// Start the connectivity bridge: every restored edge triggers a sync.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<(), SyncError> {
        let mut guard = self.bridge_handle.lock();
        if guard.is_some() {
            return Err(SyncError::Config("coordinator already started".into()));
        }

        info!("starting sync coordinator");

        let mut events = self.context.monitor.subscribe();
        let cancel = self.bridge_cancel.clone();
        let context = self.context.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("connectivity bridge cancelled");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(()) => {
                            info!("connectivity restored; triggering sync");
                            context.trigger();
                        }
                        None => break,
                    }
                }
            }
        });

        *guard = Some(handle);
        Ok(())
    }

    /// Stop the connectivity bridge and cancel any active cycle.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), SyncError> {
        info!("stopping sync coordinator");

        self.bridge_cancel.cancel();
        self.context.state.cycle_cancel.lock().cancel();

        let handle = self.bridge_handle.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.context.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "connectivity bridge task panicked");
                    return Err(SyncError::Config("connectivity bridge task panicked".into()));
                }
                Err(_) => {
                    warn!("connectivity bridge did not stop within timeout");
                    return Err(SyncError::Config("connectivity bridge join timeout".into()));
                }
            }
        }

        info!("sync coordinator stopped");
        Ok(())
    }

    /// Idempotent, single-flight sync entry point.
    ///
    /// No-op while a cycle is actively working or the device is offline;
    /// otherwise interrupts a superseded cycle's pending backoff wait and
    /// starts a fresh cycle.
    #[instrument(skip(self))]
    pub fn trigger_sync(&self) -> TriggerOutcome {
        self.context.trigger()
    }

    /// Notify the coordinator that the interactive write path produced a
    /// new unconfirmed change.
    pub fn note_local_change(&self) {
        let state = &self.context.state;
        state.pending_changes.fetch_add(1, Ordering::SeqCst);
        state.publish(state.in_flight.load(Ordering::SeqCst));
    }

    /// Current observable state.
    pub fn status(&self) -> SyncStatusSnapshot {
        self.context.state.status_tx.borrow().clone()
    }

    /// Watch observable state changes.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatusSnapshot> {
        self.context.state.status_tx.subscribe()
    }

    /// Per-record outcomes of the most recent completed cycle.
    pub fn last_report(&self) -> Option<SyncReport> {
        self.context.state.last_report.lock().clone()
    }
}

impl CycleContext {
    fn trigger(&self) -> TriggerOutcome {
        if !self.monitor.is_online() {
            debug!("sync trigger ignored: offline");
            return TriggerOutcome::Offline;
        }

        if self
            .state
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync trigger ignored: cycle already running");
            return TriggerOutcome::AlreadyRunning;
        }

        // Supersede a predecessor parked in its backoff wait.
        let fresh = CancellationToken::new();
        let old = {
            let mut guard = self.state.cycle_cancel.lock();
            std::mem::replace(&mut *guard, fresh.clone())
        };
        old.cancel();

        self.metrics.incr_cycles_started();
        self.state.publish(true);

        let context = self.clone();
        tokio::spawn(async move {
            context.run_cycle(fresh).await;
        });

        TriggerOutcome::Started
    }

    /// One cycle plus its retry chain. Runs until success, a fatal error,
    /// retry exhaustion, or supersession.
    async fn run_cycle(self, cancel: CancellationToken) {
        loop {
            let result = self.perform_sync(&cancel).await;

            if cancel.is_cancelled() {
                // Superseded or shut down; any in-flight result is
                // discarded. The single-flight flag belongs to the
                // successor now.
                debug!("sync cycle superseded");
                return;
            }

            match result {
                Ok(report) => {
                    self.complete_cycle(report).await;
                    return;
                }
                Err(err) if !err.should_retry() => {
                    warn!(error = %err, "sync cycle failed fatally");
                    self.fail_cycle(&err);
                    return;
                }
                Err(err) => {
                    let attempt = self.state.retry_count.load(Ordering::SeqCst) + 1;
                    if self.backoff.is_exhausted(attempt) {
                        error!(
                            retries = attempt - 1,
                            error = %err,
                            "sync retries exhausted"
                        );
                        self.fail_cycle(&err);
                        return;
                    }

                    self.state.retry_count.store(attempt, Ordering::SeqCst);
                    self.metrics.incr_retries();

                    let delay = self.backoff.delay(attempt);
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "sync cycle failed; backing off"
                    );

                    // Release the single-flight flag while parked so a
                    // fresh trigger can supersede the wait.
                    self.state.in_flight.store(false, Ordering::SeqCst);
                    self.state.publish(false);

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!("backoff wait cancelled");
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    if self
                        .state
                        .in_flight
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_err()
                    {
                        // A newer cycle took over while this one slept.
                        return;
                    }
                    self.state.publish(true);
                }
            }
        }
    }

    /// One bidirectional sync pass: credential, registration, all uploads,
    /// then all downloads.
    async fn perform_sync(&self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        // (1) Credential acquisition; failure is fatal for this cycle and
        // is not fed into the backoff chain.
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        // (2) One-time identity registration; re-attempted next cycle on
        // failure.
        if !self.state.registered.load(Ordering::SeqCst) {
            self.transport
                .register_identity(&self.device_id, self.config.device_name.as_deref(), &token)
                .await?;
            self.state.registered.store(true, Ordering::SeqCst);
            debug!(device_id = %self.device_id, "device registered");
        }

        let mut report = SyncReport::default();

        // (3) Upload every Pending record of every kind. A single record's
        // failure stays isolated; the record remains Pending for the next
        // cycle.
        for kind in EntityKind::ALL {
            let pending = self.store.pending(kind).await?;
            if pending.is_empty() {
                continue;
            }

            debug!(entity = %kind, count = pending.len(), "uploading pending records");

            for record in &pending {
                if cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }

                match self.transport.upsert(record, &token).await {
                    Ok(remote) => {
                        self.store.mark_synced(kind, &record.local_id, &remote.remote_id).await?;
                        self.metrics.incr_records_uploaded();
                        report.uploads.push(UploadOutcome {
                            entity: kind,
                            local_id: record.local_id.clone(),
                            error: None,
                        });
                    }
                    Err(err) if err.category() == ApiErrorCategory::Authentication => {
                        // The credential is cycle-global; abort.
                        return Err(err.into());
                    }
                    Err(err) => {
                        warn!(
                            entity = %kind,
                            local_id = %record.local_id,
                            error = %err,
                            "upload failed; record stays pending"
                        );
                        self.metrics.incr_upload_failures();
                        report.uploads.push(UploadOutcome {
                            entity: kind,
                            local_id: record.local_id.clone(),
                            error: Some(truncate_reason(&err.to_string())),
                        });
                    }
                }
            }
        }

        // (4) Only after all uploads: download remote changes per kind.
        let since_ms = (*self.state.last_sync_at.lock()).map_or(0, |t| t.timestamp_millis());

        for kind in &self.config.pull_kinds {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let rows = self.transport.list_since(*kind, since_ms, &token).await?;
            if rows.is_empty() {
                continue;
            }

            debug!(entity = %kind, count = rows.len(), "applying pulled records");

            for remote in rows {
                let local = self.store.find_by_remote_id(*kind, &remote.remote_id).await?;
                match plan_pull(local.as_ref(), &remote) {
                    PullAction::Insert | PullAction::Overwrite => {
                        self.store.apply_remote(*kind, remote.into_synced_record(*kind)).await?;
                        self.metrics.incr_records_downloaded();
                        report.downloaded += 1;
                    }
                    PullAction::KeepLocal => {}
                }
            }
        }

        Ok(report)
    }

    /// Record a fully successful cycle.
    async fn complete_cycle(&self, report: SyncReport) {
        *self.state.last_sync_at.lock() = Some(Utc::now());
        self.state.retry_count.store(0, Ordering::SeqCst);
        *self.state.last_error.lock() = None;

        let pending = self.store.pending_count().await.unwrap_or(0);
        self.state.pending_changes.store(pending, Ordering::SeqCst);

        info!(
            uploaded = report.uploaded(),
            upload_failures = report.upload_failures(),
            downloaded = report.downloaded,
            pending,
            "sync cycle completed"
        );

        *self.state.last_report.lock() = Some(report);
        self.metrics.incr_cycles_completed();

        self.state.in_flight.store(false, Ordering::SeqCst);
        self.state.publish(false);
    }

    /// Surface a cycle-level error and stop.
    fn fail_cycle(&self, err: &SyncError) {
        *self.state.last_error.lock() = Some(truncate_reason(&err.to_string()));
        self.metrics.incr_cycles_failed();

        self.state.in_flight.store(false, Ordering::SeqCst);
        self.state.publish(false);
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_ERROR_MESSAGE_LEN {
        return reason.to_string();
    }

    let mut truncated = reason
        .chars()
        .take(MAX_ERROR_MESSAGE_LEN.saturating_sub(ERROR_TRUNCATE_SUFFIX.len()))
        .collect::<String>();
    truncated.push_str(ERROR_TRUNCATE_SUFFIX);
    truncated
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        if self.bridge_handle.lock().is_some() {
            warn!("SyncCoordinator dropped while running; cancelling tasks");
            self.bridge_cancel.cancel();
            self.context.state.cycle_cancel.lock().cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_reason_bounds_long_messages() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_LEN * 2);
        let truncated = truncate_reason(&long);
        assert_eq!(truncated.len(), MAX_ERROR_MESSAGE_LEN);
        assert!(truncated.ends_with(ERROR_TRUNCATE_SUFFIX));
    }

    #[test]
    fn truncate_reason_leaves_short_messages_alone() {
        assert_eq!(truncate_reason("boom"), "boom");
    }

    #[test]
    fn report_counts_successes_and_failures() {
        let report = SyncReport {
            uploads: vec![
                UploadOutcome { entity: EntityKind::Job, local_id: "a".into(), error: None },
                UploadOutcome {
                    entity: EntityKind::Job,
                    local_id: "b".into(),
                    error: Some("boom".into()),
                },
            ],
            downloaded: 3,
        };
        assert_eq!(report.uploaded(), 1);
        assert_eq!(report.upload_failures(), 1);
    }
}
