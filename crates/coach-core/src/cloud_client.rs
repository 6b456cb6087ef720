//! Authenticated backup client scoped to one dedicated drive folder.

use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::Mutex;
use tracing::{debug, info};

use coach_domain::{BackupFileInfo, BackupKind, CloudUser, Platform, Snapshot};

use crate::{
    drive::{AccessScope, DriveApi, DriveCredentials, DriveFile, FileUpload},
    naming,
    time::Clock,
    CloudError,
};

pub const DEFAULT_FOLDER_NAME: &str = "WorkoutTracker Backups";

const PLATFORM_PROPERTY: &str = "platform";
const VERSION_PROPERTY: &str = "version";
const TIMESTAMP_PROPERTY: &str = "timestamp";

pub struct CloudBackupClient {
    api: Arc<dyn DriveApi>,
    folder_name: String,
    platform: Platform,
    clock: Arc<dyn Clock>,
    initialized: AtomicBool,
    folder_id: Mutex<Option<String>>,
}

impl CloudBackupClient {
    pub fn new(
        api: Arc<dyn DriveApi>,
        folder_name: impl Into<String>,
        platform: Platform,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            folder_name: folder_name.into(),
            platform,
            clock,
            initialized: AtomicBool::new(false),
            folder_id: Mutex::new(None),
        }
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Loads the drive SDK with app-created-files scope. Repeated calls are no-ops.
    pub async fn initialize(&self, credentials: &DriveCredentials) -> Result<(), CloudError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        self.api
            .load(credentials, AccessScope::AppCreatedFiles)
            .await?;
        self.initialized.store(true, Ordering::Release);
        debug!(scope = AccessScope::AppCreatedFiles.as_str(), "cloud client initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub async fn sign_in(&self) -> Result<CloudUser, CloudError> {
        if !self.is_initialized() {
            return Err(CloudError::NotInitialized);
        }
        let user = self.api.sign_in().await?;
        info!(user = %user.name, "signed in to cloud drive");
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), CloudError> {
        if !self.is_initialized() {
            return Ok(());
        }
        self.api.sign_out().await?;
        *self.folder_id.lock().await = None;
        info!("signed out of cloud drive");
        Ok(())
    }

    /// Local check only; never reaches the network.
    pub fn sign_in_status(&self) -> bool {
        self.is_initialized() && self.api.is_signed_in()
    }

    pub fn current_user(&self) -> Option<CloudUser> {
        if !self.is_initialized() {
            return None;
        }
        self.api.current_user()
    }

    /// Finds the backup folder by name, creating it only when absent. The id is cached.
    pub async fn ensure_backup_folder(&self) -> Result<String, CloudError> {
        self.require_signed_in()?;
        let mut cached = self.folder_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }
        let id = match self.api.find_folder(&self.folder_name).await? {
            Some(id) => id,
            None => {
                let id = self.api.create_folder(&self.folder_name).await?;
                info!(folder = %self.folder_name, "created backup folder");
                id
            }
        };
        *cached = Some(id.clone());
        Ok(id)
    }

    /// Uploads `snapshot` as a new immutable file. The body carries timestamp and version
    /// alongside the data so a downloaded file describes itself.
    pub async fn upload_backup(
        &self,
        snapshot: &Snapshot,
        file_name: Option<&str>,
    ) -> Result<BackupFileInfo, CloudError> {
        let folder_id = self.ensure_backup_folder().await?;
        let timestamp = snapshot.timestamp.unwrap_or_else(|| self.clock.now());
        let name = match file_name {
            Some(name) => name.to_string(),
            None => naming::backup_file_name(BackupKind::Manual, timestamp),
        };
        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|err| CloudError::Serde(err.to_string()))?;
        let mut properties = BTreeMap::new();
        properties.insert(PLATFORM_PROPERTY.to_string(), self.platform.to_string());
        properties.insert(VERSION_PROPERTY.to_string(), snapshot.version.clone());
        properties.insert(TIMESTAMP_PROPERTY.to_string(), timestamp.to_rfc3339());

        let file = self
            .api
            .create_file(
                &folder_id,
                FileUpload {
                    name,
                    body,
                    properties,
                },
            )
            .await?;
        info!(file_id = %file.id, name = %file.name, size = file.size, "uploaded backup");
        to_backup_info(file).ok_or_else(|| {
            CloudError::Api("uploaded file does not follow the backup naming convention".into())
        })
    }

    /// Backup files in the folder, newest first. Files outside the naming convention are skipped.
    pub async fn list_backups(&self) -> Result<Vec<BackupFileInfo>, CloudError> {
        let folder_id = self.ensure_backup_folder().await?;
        let files = self.api.list_files(&folder_id).await?;
        let total = files.len();
        let mut backups: Vec<BackupFileInfo> = files.into_iter().filter_map(to_backup_info).collect();
        backups.sort_by_key(|info| Reverse((info.created_time, info.name.clone())));
        debug!(total, backups = backups.len(), "listed backup folder");
        Ok(backups)
    }

    pub async fn download_backup(&self, file_id: &str) -> Result<String, CloudError> {
        self.require_signed_in()?;
        self.api.get_file(file_id).await
    }

    pub async fn delete_backup(&self, file_id: &str) -> Result<(), CloudError> {
        self.require_signed_in()?;
        self.api.delete_file(file_id).await?;
        info!(file_id, "deleted backup");
        Ok(())
    }

    /// Signs out and forgets the cached folder.
    pub async fn dispose(&self) -> Result<(), CloudError> {
        self.sign_out().await?;
        *self.folder_id.lock().await = None;
        Ok(())
    }

    fn require_signed_in(&self) -> Result<(), CloudError> {
        if !self.is_initialized() {
            return Err(CloudError::NotInitialized);
        }
        if !self.api.is_signed_in() {
            return Err(CloudError::NotSignedIn);
        }
        Ok(())
    }
}

fn to_backup_info(file: DriveFile) -> Option<BackupFileInfo> {
    let kind = BackupKind::from_file_name(&file.name)?;
    let platform = file
        .properties
        .get(PLATFORM_PROPERTY)
        .and_then(|tag| Platform::from_tag(tag))
        .unwrap_or_else(|| Platform::infer_from_name(&file.name));
    Some(BackupFileInfo {
        id: file.id,
        name: file.name,
        kind,
        created_time: file.created_time,
        modified_time: file.modified_time,
        size: file.size,
        platform,
    })
}
