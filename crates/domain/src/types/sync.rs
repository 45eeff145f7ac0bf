//! Sync record model
//!
//! Every business entity (job record, invoice, expense, trip, chat message,
//! inventory item) carries the same sync metadata alongside an opaque domain
//! payload. The payload is a `serde_json::Value` because remote schemas vary
//! per entity type and the sync engine is schema-agnostic.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sync state of a local record.
///
/// `Conflict` is a reserved tag: the engine auto-resolves via
/// last-write-wins and never produces it today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Matches the last known remote state
    Synced,
    /// Unconfirmed local writes exist
    Pending,
    /// Reserved; not emitted by the current engine
    Conflict,
}

/// Business entity types that participate in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Job,
    Invoice,
    Expense,
    Trip,
    ChatMessage,
    InventoryItem,
}

impl EntityKind {
    /// All kinds, in upload order.
    pub const ALL: [Self; 6] = [
        Self::Job,
        Self::Invoice,
        Self::Expense,
        Self::Trip,
        Self::ChatMessage,
        Self::InventoryItem,
    ];

    /// Stable name used in logs and storage.
    pub fn name(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Invoice => "invoice",
            Self::Expense => "expense",
            Self::Trip => "trip",
            Self::ChatMessage => "chat_message",
            Self::InventoryItem => "inventory_item",
        }
    }

    /// Remote function namespace for this kind, e.g. `jobs` in
    /// `jobs:upsert` / `jobs:listSince`.
    pub fn remote_namespace(self) -> &'static str {
        match self {
            Self::Job => "jobs",
            Self::Invoice => "invoices",
            Self::Expense => "expenses",
            Self::Trip => "trips",
            Self::ChatMessage => "messages",
            Self::InventoryItem => "inventory",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A locally stored record with its sync metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Client-generated identifier, immutable for the record's lifetime
    pub local_id: String,
    /// Entity type this record belongs to
    pub entity: EntityKind,
    /// Backend-assigned identifier; absent until first successful upload,
    /// immutable once set
    pub remote_id: Option<String>,
    /// Current sync state
    pub status: SyncStatus,
    /// Bumped on every local mutation; sole key for conflict resolution
    pub updated_at: DateTime<Utc>,
    /// Opaque domain payload
    pub payload: serde_json::Value,
}

impl SyncRecord {
    /// Create a fresh local record: Pending, no remote id.
    pub fn new_local(entity: EntityKind, payload: serde_json::Value) -> Self {
        Self {
            local_id: Uuid::now_v7().to_string(),
            entity,
            remote_id: None,
            status: SyncStatus::Pending,
            updated_at: Utc::now(),
            payload,
        }
    }

    /// Apply a local edit: replace the payload, bump `updated_at`, and
    /// re-enter Pending. `updated_at` never decreases, even if the wall
    /// clock stepped backwards.
    pub fn touch(&mut self, payload: serde_json::Value) {
        self.payload = payload;
        self.updated_at = Utc::now().max(self.updated_at);
        self.status = SyncStatus::Pending;
    }

    /// `updated_at` as ms since epoch, the wire representation.
    pub fn updated_at_ms(&self) -> i64 {
        self.updated_at.timestamp_millis()
    }
}

/// A record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    /// Backend-assigned identifier
    pub remote_id: String,
    /// Client identifier echoed back by the upsert
    pub local_id: String,
    /// Last modification time, ms since epoch
    pub updated_at: i64,
    /// Opaque domain payload
    pub payload: serde_json::Value,
}

impl RemoteRecord {
    /// `updated_at` as a `DateTime<Utc>`.
    pub fn updated_at_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.updated_at).single().unwrap_or_default()
    }

    /// Materialize as a local record that matches remote state.
    pub fn into_synced_record(self, entity: EntityKind) -> SyncRecord {
        let updated_at = self.updated_at_utc();
        SyncRecord {
            local_id: self.local_id,
            entity,
            remote_id: Some(self.remote_id),
            status: SyncStatus::Synced,
            updated_at,
            payload: self.payload,
        }
    }
}
