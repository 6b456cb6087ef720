//! File naming conventions for cloud backups and local exports.

use chrono::{DateTime, NaiveDateTime, Utc};

use coach_domain::{BackupKind, BACKUP_EXTENSION};

pub const EXPORT_PREFIX: &str = "workout-tracker-export-";
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// `workout-tracker-backup-2025-03-01T10-15-00-000Z.json` and friends.
pub fn backup_file_name(kind: BackupKind, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}{}.{}",
        kind.prefix(),
        timestamp.format(FILE_TIMESTAMP_FORMAT),
        BACKUP_EXTENSION
    )
}

pub fn export_file_name(timestamp: DateTime<Utc>) -> String {
    format!(
        "{}{}.{}",
        EXPORT_PREFIX,
        timestamp.format(FILE_TIMESTAMP_FORMAT),
        BACKUP_EXTENSION
    )
}

/// Recovers the timestamp embedded in a backup or export file name.
pub fn parse_file_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let raw = [BackupKind::Manual.prefix(), BackupKind::Auto.prefix(), EXPORT_PREFIX]
        .into_iter()
        .find_map(|prefix| stem.strip_prefix(prefix))?;
    NaiveDateTime::parse_from_str(raw, FILE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
