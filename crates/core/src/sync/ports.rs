//! Port interfaces for sync operations

use async_trait::async_trait;
use sitework_domain::{EntityKind, Result, SyncRecord};

/// Local-store collaborator interface.
///
/// The sync engine is the only writer of the sync-owned fields (remote_id,
/// status, payload-overwrite-on-pull); every other field belongs to the
/// interactive write path, which marks records Pending and bumps
/// `updated_at` on edits.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All Pending records of one entity type
    async fn pending(&self, entity: EntityKind) -> Result<Vec<SyncRecord>>;

    /// Number of Pending records across all entity types
    async fn pending_count(&self) -> Result<usize>;

    /// Look up a record by its backend-assigned identifier
    async fn find_by_remote_id(
        &self,
        entity: EntityKind,
        remote_id: &str,
    ) -> Result<Option<SyncRecord>>;

    /// Confirm an upload: attach the remote id if the record has none and
    /// set status to Synced. Must not reassign an existing remote id.
    async fn mark_synced(&self, entity: EntityKind, local_id: &str, remote_id: &str)
        -> Result<()>;

    /// Apply a pulled remote record: insert it if unknown, otherwise
    /// overwrite payload and `updated_at`, setting status directly to
    /// Synced (bypassing Pending). Never deletes.
    async fn apply_remote(&self, entity: EntityKind, record: SyncRecord) -> Result<()>;
}
