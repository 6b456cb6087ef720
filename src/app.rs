//! Composition root: builds the storage, drive, cloud client and backup service from
//! configuration and hands them out explicitly.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use coach_config::{Config, ConfigManager};
use coach_core::{
    AutoBackupOutcome, BackupService, Clock, CloudBackupClient, CloudClientFactory,
    DriveCredentials, LocalStateStore, SessionRunner, StateRepository, SystemClock,
};
use coach_domain::{CloudUser, CompletedSession, Platform, WorkoutTemplate};
use coach_storage_json::{FolderDriveFactory, JsonStateStore};

use crate::errors::TrainerError;

pub struct TrainerApp {
    home: PathBuf,
    config: Config,
    clock: Arc<dyn Clock>,
    backups: Arc<BackupService>,
}

impl TrainerApp {
    /// Loads `<home>/config/config.json` and opens the JSON store and folder drive it
    /// points at.
    pub fn open(home: &Path) -> Result<Self, TrainerError> {
        let config = ConfigManager::with_base_dir(home)?.load_or_create()?;
        let store = Arc::new(JsonStateStore::new(config.resolve_data_root(home))?);
        let factory = FolderDriveFactory::new(
            config.resolve_drive_root(home),
            account_for(&config),
            platform_for(&config),
        );
        Self::from_parts(home, config, store, &factory, Arc::new(SystemClock))
    }

    pub fn from_parts(
        home: &Path,
        config: Config,
        store: Arc<dyn LocalStateStore>,
        factory: &dyn CloudClientFactory,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TrainerError> {
        let drive = factory.create()?;
        let cloud = Arc::new(CloudBackupClient::new(
            drive,
            config.cloud.folder_name.clone(),
            factory.platform(),
            clock.clone(),
        ));
        let credentials = DriveCredentials {
            api_key: config.cloud.api_key.clone(),
            client_id: config.cloud.client_id.clone(),
        };
        let interval = Duration::minutes(i64::from(config.auto_backup_interval_minutes));
        let backups = BackupService::new(
            cloud,
            StateRepository::new(store),
            clock.clone(),
            credentials,
        )
        .with_auto_backup_interval(interval);

        info!(
            home = %home.display(),
            platform = %factory.platform(),
            folder = %config.cloud.folder_name,
            "trainer app assembled"
        );

        Ok(Self {
            home: home.to_path_buf(),
            config,
            clock,
            backups: Arc::new(backups),
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backups(&self) -> &Arc<BackupService> {
        &self.backups
    }

    pub fn state(&self) -> &StateRepository {
        self.backups.state()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.config.resolve_export_root()
    }

    /// Loads the cloud client with the configured credentials. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<(), TrainerError> {
        self.backups.initialize().await?;
        Ok(())
    }

    /// Signs out and forgets the cached backup folder.
    pub async fn dispose(&self) -> Result<(), TrainerError> {
        self.backups.dispose().await?;
        Ok(())
    }

    pub fn start_session(
        &self,
        client_id: Option<Uuid>,
        template: &WorkoutTemplate,
    ) -> SessionRunner {
        SessionRunner::from_template(client_id, template, self.clock.clone())
    }

    /// Appends a finished session to the history, then gives auto-backup a chance to run.
    pub async fn record_session(
        &self,
        record: CompletedSession,
    ) -> Result<AutoBackupOutcome, TrainerError> {
        info!(workout = %record.workout_name, "recording completed session");
        self.state().append_history(record)?;
        Ok(self.backups.create_auto_backup().await)
    }
}

fn account_for(config: &Config) -> CloudUser {
    CloudUser {
        name: config.cloud.account_name.clone(),
        email: config.cloud.account_email.clone(),
    }
}

fn platform_for(config: &Config) -> Platform {
    Platform::from_tag(&config.platform).unwrap_or_else(|| {
        warn!(platform = %config.platform, "unknown platform tag, using Desktop");
        Platform::Desktop
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_tags_fall_back_to_desktop() {
        let mut config = Config::default();
        config.platform = "Amiga".into();
        assert_eq!(platform_for(&config), Platform::Desktop);
        config.platform = "iOS".into();
        assert_eq!(platform_for(&config), Platform::Ios);
    }

    #[test]
    fn account_comes_from_cloud_settings() {
        let mut config = Config::default();
        config.cloud.account_email = Some("coach@example.com".into());
        let account = account_for(&config);
        assert_eq!(account.name, "Trainer");
        assert_eq!(account.email.as_deref(), Some("coach@example.com"));
    }
}
