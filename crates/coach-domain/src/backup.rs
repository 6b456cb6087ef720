//! Metadata describing backup files held by the cloud file store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANUAL_BACKUP_PREFIX: &str = "workout-tracker-backup-";
pub const AUTO_BACKUP_PREFIX: &str = "workout-tracker-auto-backup-";
pub const BACKUP_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Distinguishes user-triggered backups from the rate-limited automatic ones.
pub enum BackupKind {
    Manual,
    Auto,
}

impl BackupKind {
    pub fn prefix(self) -> &'static str {
        match self {
            BackupKind::Manual => MANUAL_BACKUP_PREFIX,
            BackupKind::Auto => AUTO_BACKUP_PREFIX,
        }
    }

    /// Recognises a backup by its file name; anything else in the folder is ignored.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if !name.ends_with(&format!(".{}", BACKUP_EXTENSION)) {
            return None;
        }
        [BackupKind::Manual, BackupKind::Auto]
            .into_iter()
            .find(|kind| name.starts_with(kind.prefix()))
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackupKind::Manual => "manual",
            BackupKind::Auto => "auto",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
/// Device family that produced a backup. Display only.
pub enum Platform {
    #[serde(rename = "iOS")]
    Ios,
    Android,
    #[default]
    Web,
    Desktop,
}

impl Platform {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            "web" => Some(Platform::Web),
            "desktop" => Some(Platform::Desktop),
            _ => None,
        }
    }

    /// Falls back to the naming convention when a file carries no platform property.
    pub fn infer_from_name(name: &str) -> Self {
        let lowered = name.to_ascii_lowercase();
        if lowered.contains("ios") {
            Platform::Ios
        } else if lowered.contains("android") {
            Platform::Android
        } else {
            Platform::Web
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
            Platform::Web => "Web",
            Platform::Desktop => "Desktop",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFileInfo {
    pub id: String,
    pub name: String,
    pub kind: BackupKind,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub size: u64,
    pub platform: Platform,
}

/// Identity of the signed-in cloud account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
