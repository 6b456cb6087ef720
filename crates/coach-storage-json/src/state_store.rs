use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use coach_core::{CoreError, LocalStateStore};
use tracing::debug;

use crate::{is_plain_segment, write_atomic};

const KEY_EXTENSION: &str = "json";

/// Local state store keeping one JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    root: PathBuf,
}

impl JsonStateStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_path(&self, key: &str) -> Result<PathBuf, CoreError> {
        if !is_plain_segment(key) {
            return Err(CoreError::Storage(format!("invalid state key `{}`", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, KEY_EXTENSION)))
    }
}

impl LocalStateStore for JsonStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.key_path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.key_path(key)?;
        write_atomic(&path, value)?;
        debug!(key, bytes = value.len(), "state key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match fs::remove_file(self.key_path(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
