//! Last-write-wins reconciliation for pulled records
//!
//! A download never deletes local state; the only decisions are insert,
//! overwrite, or keep-local.

use sitework_domain::{RemoteRecord, SyncRecord};
use tracing::trace;

/// What to do with one pulled remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullAction {
    /// No local record carries this remote id; create one as Synced
    Insert,
    /// Remote is strictly newer; overwrite the local payload
    Overwrite,
    /// Local is at least as new; leave it untouched. A still-Pending local
    /// upload will overwrite the server on the next pass.
    KeepLocal,
}

/// Decide how a pulled record reconciles against the local copy, keyed by
/// remote id. Overwrite only when `remote.updated_at` is strictly greater;
/// ties favor local.
pub fn plan_pull(local: Option<&SyncRecord>, remote: &RemoteRecord) -> PullAction {
    let Some(local) = local else {
        return PullAction::Insert;
    };

    let action = if remote.updated_at > local.updated_at_ms() {
        PullAction::Overwrite
    } else {
        PullAction::KeepLocal
    };

    trace!(
        remote_id = %remote.remote_id,
        local_ms = local.updated_at_ms(),
        remote_ms = remote.updated_at,
        ?action,
        "planned pull"
    );

    action
}

#[cfg(test)]
mod tests {
    use sitework_domain::{EntityKind, SyncStatus};

    use super::*;

    fn local_at(ms: i64) -> SyncRecord {
        let remote = RemoteRecord {
            remote_id: "rec_1".into(),
            local_id: "loc_1".into(),
            updated_at: ms,
            payload: serde_json::json!({"v": "local"}),
        };
        remote.into_synced_record(EntityKind::Expense)
    }

    fn remote_at(ms: i64) -> RemoteRecord {
        RemoteRecord {
            remote_id: "rec_1".into(),
            local_id: "loc_1".into(),
            updated_at: ms,
            payload: serde_json::json!({"v": "remote"}),
        }
    }

    #[test]
    fn unknown_remote_id_inserts() {
        assert_eq!(plan_pull(None, &remote_at(1_000)), PullAction::Insert);
    }

    #[test]
    fn strictly_newer_remote_overwrites() {
        let local = local_at(1_000);
        assert_eq!(plan_pull(Some(&local), &remote_at(1_001)), PullAction::Overwrite);
    }

    #[test]
    fn equal_timestamps_keep_local() {
        let local = local_at(1_000);
        assert_eq!(plan_pull(Some(&local), &remote_at(1_000)), PullAction::KeepLocal);
    }

    #[test]
    fn older_remote_keeps_local() {
        let local = local_at(2_000);
        assert_eq!(plan_pull(Some(&local), &remote_at(1_999)), PullAction::KeepLocal);
    }

    #[test]
    fn keep_local_applies_to_pending_records_too() {
        let mut local = local_at(5_000);
        local.status = SyncStatus::Pending;
        assert_eq!(plan_pull(Some(&local), &remote_at(5_000)), PullAction::KeepLocal);
    }
}
