//! Orchestrates backups of the local state store into the cloud folder and back.

use std::{fs, path::Path, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use coach_domain::{BackupFileInfo, BackupKind, CloudUser, Snapshot};

use crate::{
    cloud_client::CloudBackupClient,
    drive::DriveCredentials,
    naming,
    state::StateRepository,
    sync::{newest_wins, SyncDecision},
    time::Clock,
    BackupError,
};

pub const DEFAULT_AUTO_BACKUP_INTERVAL_MINUTES: i64 = 60;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReceipt {
    pub file_id: String,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub message: String,
    /// Timestamp recorded inside the restored snapshot, if it carried one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Local state keys that were overwritten.
    pub restored: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoBackupSkip {
    Disabled,
    RateLimited { next_due: DateTime<Utc> },
    NotSignedIn,
}

/// Auto-backup never fails loudly; every path ends in one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoBackupOutcome {
    Uploaded(BackupReceipt),
    Skipped(AutoBackupSkip),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Merged {
        file_name: String,
        timestamp: DateTime<Utc>,
        restored: Vec<&'static str>,
    },
    UpToDate {
        remote_timestamp: DateTime<Utc>,
    },
    NoRemoteBackups,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStatus {
    pub signed_in: bool,
    pub auto_backup_enabled: bool,
    pub last_backup_time: Option<DateTime<Utc>>,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub user: Option<CloudUser>,
}

pub struct BackupService {
    cloud: Arc<CloudBackupClient>,
    state: StateRepository,
    clock: Arc<dyn Clock>,
    credentials: DriveCredentials,
    auto_backup_interval: Duration,
}

impl BackupService {
    pub fn new(
        cloud: Arc<CloudBackupClient>,
        state: StateRepository,
        clock: Arc<dyn Clock>,
        credentials: DriveCredentials,
    ) -> Self {
        Self {
            cloud,
            state,
            clock,
            credentials,
            auto_backup_interval: Duration::minutes(DEFAULT_AUTO_BACKUP_INTERVAL_MINUTES),
        }
    }

    pub fn with_auto_backup_interval(mut self, interval: Duration) -> Self {
        self.auto_backup_interval = interval;
        self
    }

    pub fn cloud(&self) -> &Arc<CloudBackupClient> {
        &self.cloud
    }

    pub fn state(&self) -> &StateRepository {
        &self.state
    }

    pub async fn initialize(&self) -> Result<(), BackupError> {
        self.cloud.initialize(&self.credentials).await?;
        Ok(())
    }

    pub async fn dispose(&self) -> Result<(), BackupError> {
        self.cloud.dispose().await?;
        Ok(())
    }

    /// Prompts for sign-in when no session exists yet.
    pub async fn sign_in(&self) -> Result<CloudUser, BackupError> {
        self.initialize().await?;
        Ok(self.cloud.sign_in().await?)
    }

    pub async fn sign_out(&self) -> Result<(), BackupError> {
        self.cloud.sign_out().await?;
        Ok(())
    }

    pub async fn create_manual_backup(&self) -> Result<BackupReceipt, BackupError> {
        self.ensure_signed_in().await?;
        let snapshot = self.build_snapshot()?;
        let receipt = self.upload(&snapshot, BackupKind::Manual).await?;
        info!(file = %receipt.file_name, "manual backup created");
        Ok(receipt)
    }

    /// Best-effort backup: skips quietly when disabled, rate limited or signed out,
    /// and only logs failures.
    pub async fn create_auto_backup(&self) -> AutoBackupOutcome {
        match self.try_auto_backup().await {
            Ok(AutoBackupOutcome::Skipped(reason)) => {
                debug!(?reason, "auto-backup skipped");
                AutoBackupOutcome::Skipped(reason)
            }
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "auto-backup failed");
                AutoBackupOutcome::Failed(err.to_string())
            }
        }
    }

    /// Runs [`create_auto_backup`](Self::create_auto_backup) on the runtime without waiting.
    pub fn spawn_auto_backup(self: &Arc<Self>) -> JoinHandle<AutoBackupOutcome> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.create_auto_backup().await })
    }

    pub async fn list_backups(&self) -> Result<Vec<BackupFileInfo>, BackupError> {
        self.ensure_signed_in().await?;
        Ok(self.cloud.list_backups().await?)
    }

    /// Overwrites every list key the backup carries. Callers confirm intent first.
    pub async fn restore_from_backup(&self, file_id: &str) -> Result<RestoreReport, BackupError> {
        self.ensure_signed_in().await?;
        let body = self.cloud.download_backup(file_id).await?;
        let snapshot = decode_snapshot(&body)?;
        let report = self.apply(&snapshot, file_id)?;
        info!(file_id, restored = ?report.restored, "backup restored");
        Ok(report)
    }

    /// Returns `false` instead of an error; the failure is logged.
    pub async fn delete_backup(&self, file_id: &str) -> bool {
        let outcome = match self.ensure_signed_in().await {
            Ok(()) => self.cloud.delete_backup(file_id).await.map_err(BackupError::from),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(file_id, error = %err, "failed to delete backup");
                false
            }
        }
    }

    /// Writes the current snapshot into `dir` and returns the generated file name.
    pub fn export_data_as_file(&self, dir: &Path) -> Result<String, BackupError> {
        let snapshot = self.build_snapshot()?;
        let timestamp = snapshot.timestamp.unwrap_or_else(|| self.clock.now());
        let file_name = naming::export_file_name(timestamp);
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|err| BackupError::Parse(err.to_string()))?;
        fs::create_dir_all(dir)?;
        fs::write(dir.join(&file_name), json)?;
        info!(file = %file_name, dir = %dir.display(), "exported snapshot");
        Ok(file_name)
    }

    pub fn import_data_from_file(&self, path: &Path) -> Result<RestoreReport, BackupError> {
        let raw = fs::read_to_string(path)?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.import_data_from_str(&raw, &source)
    }

    /// Same overwrite semantics as a restore; a missing `data` key is a parse failure here.
    pub fn import_data_from_str(
        &self,
        raw: &str,
        source: &str,
    ) -> Result<RestoreReport, BackupError> {
        let snapshot = decode_snapshot(raw).map_err(|err| match err {
            BackupError::InvalidFormat(msg) => BackupError::Parse(msg),
            other => other,
        })?;
        let report = self.apply(&snapshot, source)?;
        info!(source, restored = ?report.restored, "snapshot imported");
        Ok(report)
    }

    /// Applies the newest remote backup when it is strictly newer than the local sync point.
    ///
    /// Backups that fail to decode are logged and passed over in favour of the next
    /// newest one. If none decode, the newest one's error is returned.
    pub async fn force_sync_with_remote(&self) -> Result<SyncStatus, BackupError> {
        self.ensure_signed_in().await?;
        let backups = self.cloud.list_backups().await?;
        if backups.is_empty() {
            info!("no remote backups to sync from");
            return Ok(SyncStatus::NoRemoteBackups);
        }

        let mut first_error = None;
        let mut candidate = None;
        for info in &backups {
            let body = self.cloud.download_backup(&info.id).await?;
            match decode_snapshot(&body) {
                Ok(snapshot) => {
                    candidate = Some((info, snapshot));
                    break;
                }
                Err(err @ (BackupError::InvalidFormat(_) | BackupError::Parse(_))) => {
                    warn!(file = %info.name, error = %err, "skipping unreadable backup");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        let Some((latest, snapshot)) = candidate else {
            return Err(first_error
                .unwrap_or_else(|| BackupError::InvalidFormat("no readable backups".into())));
        };

        let remote_timestamp = snapshot.timestamp.unwrap_or(latest.created_time);
        let local = self.state.settings()?.local_sync_point();

        match newest_wins(remote_timestamp, local) {
            SyncDecision::UpToDate => {
                debug!(%remote_timestamp, ?local, "local data is up to date");
                Ok(SyncStatus::UpToDate { remote_timestamp })
            }
            SyncDecision::ApplyRemote => {
                let report = self.apply(&snapshot, &latest.name)?;
                self.state.set_last_sync_time(remote_timestamp)?;
                info!(file = %latest.name, %remote_timestamp, "merged remote backup");
                Ok(SyncStatus::Merged {
                    file_name: latest.name.clone(),
                    timestamp: remote_timestamp,
                    restored: report.restored,
                })
            }
        }
    }

    pub fn backup_status(&self) -> Result<BackupStatus, BackupError> {
        let settings = self.state.settings()?;
        Ok(BackupStatus {
            signed_in: self.cloud.sign_in_status(),
            auto_backup_enabled: settings.auto_backup_enabled,
            last_backup_time: settings.last_backup_time,
            last_sync_time: settings.last_sync_time,
            user: self.cloud.current_user(),
        })
    }

    pub fn set_auto_backup_enabled(&self, enabled: bool) -> Result<(), BackupError> {
        self.state.set_auto_backup_enabled(enabled)?;
        info!(enabled, "auto-backup setting changed");
        Ok(())
    }

    async fn ensure_signed_in(&self) -> Result<(), BackupError> {
        self.initialize().await?;
        if !self.cloud.sign_in_status() {
            self.cloud.sign_in().await?;
        }
        Ok(())
    }

    async fn try_auto_backup(&self) -> Result<AutoBackupOutcome, BackupError> {
        let settings = self.state.settings()?;
        if !settings.auto_backup_enabled {
            return Ok(AutoBackupOutcome::Skipped(AutoBackupSkip::Disabled));
        }
        if let Some(last) = settings.last_backup_time {
            let next_due = last + self.auto_backup_interval;
            if self.clock.now() < next_due {
                return Ok(AutoBackupOutcome::Skipped(AutoBackupSkip::RateLimited {
                    next_due,
                }));
            }
        }
        if !self.cloud.sign_in_status() {
            return Ok(AutoBackupOutcome::Skipped(AutoBackupSkip::NotSignedIn));
        }
        let snapshot = self.build_snapshot()?;
        let receipt = self.upload(&snapshot, BackupKind::Auto).await?;
        info!(file = %receipt.file_name, "auto-backup created");
        Ok(AutoBackupOutcome::Uploaded(receipt))
    }

    fn build_snapshot(&self) -> Result<Snapshot, BackupError> {
        Ok(Snapshot::new(self.clock.now(), self.state.snapshot_data()?))
    }

    async fn upload(
        &self,
        snapshot: &Snapshot,
        kind: BackupKind,
    ) -> Result<BackupReceipt, BackupError> {
        let timestamp = snapshot.timestamp.unwrap_or_else(|| self.clock.now());
        let name = naming::backup_file_name(kind, timestamp);
        let info = self.cloud.upload_backup(snapshot, Some(name.as_str())).await?;
        self.state.set_last_backup_time(timestamp)?;
        Ok(BackupReceipt {
            file_id: info.id,
            file_name: info.name,
            timestamp,
        })
    }

    fn apply(&self, snapshot: &Snapshot, source: &str) -> Result<RestoreReport, BackupError> {
        let restored = self.state.apply_snapshot_data(&snapshot.data)?;
        let message = if restored.is_empty() {
            format!("{} contained no data to restore", source)
        } else {
            format!("Restored {} from {}", restored.join(", "), source)
        };
        Ok(RestoreReport {
            message,
            timestamp: snapshot.timestamp,
            restored,
        })
    }
}

/// Validates the document shape before anything is written locally.
pub fn decode_snapshot(raw: &str) -> Result<Snapshot, BackupError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| BackupError::Parse(err.to_string()))?;
    match value.get("data") {
        Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(BackupError::InvalidFormat(
                "`data` must be a JSON object".into(),
            ))
        }
        None => return Err(BackupError::InvalidFormat("missing `data` key".into())),
    }
    serde_json::from_value(value).map_err(|err| BackupError::InvalidFormat(err.to_string()))
}
