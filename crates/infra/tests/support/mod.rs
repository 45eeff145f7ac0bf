//! Shared test doubles: an in-memory record store and a scripted backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sitework_core::RecordStore;
use sitework_domain::{EntityKind, RemoteRecord, Result as DomainResult, SyncRecord, SyncStatus};
use sitework_infra::api::ApiError;
use sitework_infra::sync::{RecordTransport, SyncCoordinator, SyncStatusSnapshot};

/// In-memory record store keyed by local id.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, SyncRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SyncRecord) {
        self.records.lock().insert(record.local_id.clone(), record);
    }

    pub fn get(&self, local_id: &str) -> Option<SyncRecord> {
        self.records.lock().get(local_id).cloned()
    }

    /// Flip a record back to Pending, simulating either a local edit or a
    /// crash between a confirmed upsert and the local status write.
    pub fn force_pending(&self, local_id: &str) {
        if let Some(record) = self.records.lock().get_mut(local_id) {
            record.status = SyncStatus::Pending;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn pending(&self, entity: EntityKind) -> DomainResult<Vec<SyncRecord>> {
        Ok(self
            .records
            .lock()
            .values()
            .filter(|r| r.entity == entity && r.status == SyncStatus::Pending)
            .cloned()
            .collect())
    }

    async fn pending_count(&self) -> DomainResult<usize> {
        Ok(self.records.lock().values().filter(|r| r.status == SyncStatus::Pending).count())
    }

    async fn find_by_remote_id(
        &self,
        entity: EntityKind,
        remote_id: &str,
    ) -> DomainResult<Option<SyncRecord>> {
        Ok(self
            .records
            .lock()
            .values()
            .find(|r| r.entity == entity && r.remote_id.as_deref() == Some(remote_id))
            .cloned())
    }

    async fn mark_synced(
        &self,
        _entity: EntityKind,
        local_id: &str,
        remote_id: &str,
    ) -> DomainResult<()> {
        if let Some(record) = self.records.lock().get_mut(local_id) {
            if record.remote_id.is_none() {
                record.remote_id = Some(remote_id.to_string());
            }
            record.status = SyncStatus::Synced;
        }
        Ok(())
    }

    async fn apply_remote(&self, entity: EntityKind, record: SyncRecord) -> DomainResult<()> {
        let mut records = self.records.lock();
        let existing_id = records
            .values()
            .find(|r| r.entity == entity && r.remote_id == record.remote_id)
            .map(|r| r.local_id.clone());

        match existing_id {
            Some(local_id) => {
                if let Some(existing) = records.get_mut(&local_id) {
                    existing.payload = record.payload;
                    existing.updated_at = record.updated_at;
                    existing.status = SyncStatus::Synced;
                }
            }
            None => {
                records.insert(record.local_id.clone(), record);
            }
        }
        Ok(())
    }
}

struct StoredRemote {
    entity: EntityKind,
    record: RemoteRecord,
}

/// Scripted backend shared between coordinators in multi-device tests.
///
/// Applies last-write-wins on upsert (like the real backend) and supports
/// scripted failures for retry and isolation tests.
#[derive(Default)]
pub struct FakeBackend {
    records: Mutex<HashMap<String, StoredRemote>>,
    next_id: AtomicU32,
    upsert_calls: Mutex<HashMap<String, u32>>,
    list_calls: AtomicU32,
    register_calls: AtomicU32,
    fail_lists_remaining: AtomicU32,
    fail_upserts: Mutex<HashSet<String>>,
    reject_auth: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` list calls with a transport error.
    pub fn fail_next_lists(&self, n: u32) {
        self.fail_lists_remaining.store(n, Ordering::SeqCst);
    }

    /// Fail every upsert of the given record with a server error.
    pub fn fail_upsert_for(&self, local_id: &str) {
        self.fail_upserts.lock().insert(local_id.to_string());
    }

    pub fn clear_upsert_failures(&self) {
        self.fail_upserts.lock().clear();
    }

    /// Reject every upsert with an authentication error.
    pub fn reject_with_auth(&self, reject: bool) {
        self.reject_auth.store(reject, Ordering::SeqCst);
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn upsert_calls_for(&self, local_id: &str) -> u32 {
        self.upsert_calls.lock().get(local_id).copied().unwrap_or(0)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn payload_of(&self, local_id: &str) -> Option<serde_json::Value> {
        self.records.lock().get(local_id).map(|r| r.record.payload.clone())
    }

    /// Seed a record as if another device had uploaded it.
    pub fn seed(&self, entity: EntityKind, record: RemoteRecord) {
        self.records
            .lock()
            .insert(record.local_id.clone(), StoredRemote { entity, record });
    }
}

#[async_trait]
impl RecordTransport for FakeBackend {
    async fn upsert(&self, record: &SyncRecord, _token: &str) -> Result<RemoteRecord, ApiError> {
        if self.reject_auth.load(Ordering::SeqCst) {
            return Err(ApiError::Auth("token expired".into()));
        }

        *self.upsert_calls.lock().entry(record.local_id.clone()).or_insert(0) += 1;

        if self.fail_upserts.lock().contains(&record.local_id) {
            return Err(ApiError::Server { status: 500, body: "upsert failed".into() });
        }

        let mut records = self.records.lock();
        if let Some(stored) = records.get_mut(&record.local_id) {
            // Idempotent update keyed by local id; last write wins.
            if record.updated_at_ms() > stored.record.updated_at {
                stored.record.updated_at = record.updated_at_ms();
                stored.record.payload = record.payload.clone();
            }
            return Ok(stored.record.clone());
        }

        let remote_id = format!("rec_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let remote = RemoteRecord {
            remote_id,
            local_id: record.local_id.clone(),
            updated_at: record.updated_at_ms(),
            payload: record.payload.clone(),
        };
        records.insert(
            record.local_id.clone(),
            StoredRemote { entity: record.entity, record: remote.clone() },
        );
        Ok(remote)
    }

    async fn list_since(
        &self,
        entity: EntityKind,
        since_ms: i64,
        _token: &str,
    ) -> Result<Vec<RemoteRecord>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_lists_remaining.load(Ordering::SeqCst) > 0 {
            self.fail_lists_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(ApiError::Network("connection reset".into()));
        }

        Ok(self
            .records
            .lock()
            .values()
            .filter(|r| r.entity == entity && r.record.updated_at >= since_ms)
            .map(|r| r.record.clone())
            .collect())
    }

    async fn register_identity(
        &self,
        _device_id: &str,
        _device_name: Option<&str>,
        _token: &str,
    ) -> Result<(), ApiError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll the coordinator's observable state until `pred` holds.
///
/// Relies on the paused test clock auto-advancing through sleeps; panics
/// after an hour of virtual time.
pub async fn wait_until<F>(coordinator: &SyncCoordinator, pred: F) -> SyncStatusSnapshot
where
    F: Fn(&SyncStatusSnapshot) -> bool,
{
    for _ in 0..72_000 {
        let status = coordinator.status();
        if pred(&status) {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached within virtual deadline");
}
