use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Overrides the app home directory when set.
pub const HOME_ENV_VAR: &str = "TRAINER_CORE_HOME";
const HOME_DIR_NAME: &str = ".trainer_core";

/// `$TRAINER_CORE_HOME`, else `~/.trainer_core`.
pub fn default_home() -> PathBuf {
    if let Some(path) = std::env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HOME_DIR_NAME)
}

/// Stores user-configurable backup preferences and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cloud: CloudSettings,
    #[serde(default = "Config::default_platform")]
    pub platform: String,
    #[serde(default = "Config::default_auto_backup_interval_minutes")]
    pub auto_backup_interval_minutes: u32,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Local state store directory. Defaults to `<home>/data`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Directory standing in for the cloud drive. Defaults to `<home>/drive`.
    pub drive_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Target of manual exports. Defaults to the documents directory.
    pub export_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cloud: CloudSettings::default(),
            platform: Self::default_platform(),
            auto_backup_interval_minutes: Self::default_auto_backup_interval_minutes(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_root: None,
            drive_root: None,
            export_root: None,
        }
    }
}

impl Config {
    pub fn default_platform() -> String {
        "Desktop".into()
    }

    pub fn default_auto_backup_interval_minutes() -> u32 {
        60
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// Rejects values the backup service cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auto_backup_interval_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "auto_backup_interval_minutes",
                reason: "must be at least 1".into(),
            });
        }
        let folder = self.cloud.folder_name.trim();
        let unusable = folder.is_empty()
            || folder.starts_with('.')
            || folder.contains(|c: char| c == '/' || c == '\\');
        if unusable {
            return Err(ConfigError::Invalid {
                field: "cloud.folder_name",
                reason: format!("`{}` is not a usable folder name", self.cloud.folder_name),
            });
        }
        Ok(())
    }

    pub fn resolve_data_root(&self, home: &Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| home.join("data"))
    }

    pub fn resolve_drive_root(&self, home: &Path) -> PathBuf {
        self.drive_root
            .clone()
            .unwrap_or_else(|| home.join("drive"))
    }

    pub fn resolve_export_root(&self) -> PathBuf {
        if let Some(path) = &self.export_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("WorkoutTracker Exports")
    }
}

/// Credentials and account details for the cloud drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "CloudSettings::default_folder_name")]
    pub folder_name: String,
    #[serde(default = "CloudSettings::default_account_name")]
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_email: Option<String>,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            client_id: String::new(),
            folder_name: Self::default_folder_name(),
            account_name: Self::default_account_name(),
            account_email: None,
        }
    }
}

impl CloudSettings {
    pub fn default_folder_name() -> String {
        "WorkoutTracker Backups".into()
    }

    pub fn default_account_name() -> String {
        "Trainer".into()
    }
}
