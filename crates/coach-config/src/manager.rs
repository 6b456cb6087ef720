use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Config, ConfigError};

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";

/// Reads and writes `config.json`. Every load is validated.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// `<base>/config/config.json`; the directory is created up front.
    pub fn with_base_dir(base: &Path) -> Result<Self, ConfigError> {
        let dir = base.join(CONFIG_DIR);
        fs::create_dir_all(&dir).map_err(ConfigError::io(&dir))?;
        Ok(Self::new(dir.join(CONFIG_FILE)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Missing file means defaults. Missing fields are filled in.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let config = match fs::read_to_string(&self.config_path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| ConfigError::Serde {
                path: self.config_path.clone(),
                message: err.to_string(),
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(err) => return Err(ConfigError::io(&self.config_path)(err)),
        };
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but writes the defaults out on first run so the
    /// credentials can be filled in by hand.
    pub fn load_or_create(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            return self.load();
        }
        let config = Config::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Validates, then replaces the file through a sibling `.tmp`.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde {
            path: self.config_path.clone(),
            message: err.to_string(),
        })?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::io(parent))?;
        }
        let staged = self.config_path.with_extension("json.tmp");
        fs::write(&staged, json).map_err(ConfigError::io(&staged))?;
        fs::rename(&staged, &self.config_path).map_err(ConfigError::io(&self.config_path))
    }
}
