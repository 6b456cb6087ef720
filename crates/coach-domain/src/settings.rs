use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backup-related preferences kept in the local state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "Settings::default_auto_backup_enabled")]
    pub auto_backup_enabled: bool,
    #[serde(default)]
    pub last_backup_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_backup_enabled: Self::default_auto_backup_enabled(),
            last_backup_time: None,
            last_sync_time: None,
        }
    }
}

impl Settings {
    pub fn default_auto_backup_enabled() -> bool {
        true
    }

    /// The most recent point at which local data was known to match a remote snapshot.
    pub fn local_sync_point(&self) -> Option<DateTime<Utc>> {
        match (self.last_sync_time, self.last_backup_time) {
            (Some(sync), Some(backup)) => Some(sync.max(backup)),
            (sync, backup) => sync.or(backup),
        }
    }
}
