//! Newest-wins reconciliation between the local store and the latest remote snapshot.
//!
//! The comparison is at whole-snapshot granularity. Edits made on two devices between
//! syncs are not detected: the newer snapshot replaces everything and the other device's
//! changes are lost.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    ApplyRemote,
    UpToDate,
}

/// Remote wins only when strictly newer than the local sync point.
/// A device that has never synced or backed up always takes the remote snapshot.
pub fn newest_wins(remote: DateTime<Utc>, local: Option<DateTime<Utc>>) -> SyncDecision {
    match local {
        Some(local) if remote <= local => SyncDecision::UpToDate,
        _ => SyncDecision::ApplyRemote,
    }
}
