//! Local state store contract and the typed repository the services read through.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use coach_domain::{
    Client, CompletedSession, ScheduledSession, Settings, SnapshotData, SnapshotSettings,
    WorkoutTemplate,
};

use crate::CoreError;

/// Fixed key names of the local state store. Values are JSON strings.
pub mod keys {
    pub const CLIENTS: &str = "clients";
    pub const SESSIONS: &str = "sessions";
    pub const CUSTOM_WORKOUTS: &str = "customWorkouts";
    pub const WORKOUT_HISTORY: &str = "workoutHistory";
    pub const AUTO_BACKUP_ENABLED: &str = "autoBackupEnabled";
    pub const LAST_BACKUP_TIME: &str = "lastBackupTime";
    pub const LAST_SYNC_TIME: &str = "lastSyncTime";
}

/// Synchronous string key-value persistence. No transactions.
pub trait LocalStateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// Typed access to the well-known keys of a [`LocalStateStore`].
#[derive(Clone)]
pub struct StateRepository {
    store: Arc<dyn LocalStateStore>,
}

impl StateRepository {
    pub fn new(store: Arc<dyn LocalStateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LocalStateStore> {
        &self.store
    }

    /// Raw records stored under a list key, in stored order. Missing key means empty.
    pub fn records(&self, key: &str) -> Result<Vec<Value>, CoreError> {
        Ok(self.read(key)?.unwrap_or_default())
    }

    pub fn set_records(&self, key: &str, records: &[Value]) -> Result<(), CoreError> {
        self.write(key, records)
    }

    pub fn clients(&self) -> Result<Vec<Client>, CoreError> {
        self.typed_records(keys::CLIENTS)
    }

    pub fn set_clients(&self, clients: &[Client]) -> Result<(), CoreError> {
        self.write(keys::CLIENTS, &clients)
    }

    pub fn sessions(&self) -> Result<Vec<ScheduledSession>, CoreError> {
        self.typed_records(keys::SESSIONS)
    }

    pub fn set_sessions(&self, sessions: &[ScheduledSession]) -> Result<(), CoreError> {
        self.write(keys::SESSIONS, &sessions)
    }

    pub fn custom_workouts(&self) -> Result<Vec<WorkoutTemplate>, CoreError> {
        self.typed_records(keys::CUSTOM_WORKOUTS)
    }

    pub fn set_custom_workouts(&self, workouts: &[WorkoutTemplate]) -> Result<(), CoreError> {
        self.write(keys::CUSTOM_WORKOUTS, &workouts)
    }

    pub fn workout_history(&self) -> Result<Vec<CompletedSession>, CoreError> {
        self.typed_records(keys::WORKOUT_HISTORY)
    }

    pub fn set_workout_history(&self, history: &[CompletedSession]) -> Result<(), CoreError> {
        self.write(keys::WORKOUT_HISTORY, &history)
    }

    /// Appends a finished session to `workoutHistory`. Existing records are kept as stored.
    pub fn append_history(&self, record: CompletedSession) -> Result<(), CoreError> {
        let mut history = self.records(keys::WORKOUT_HISTORY)?;
        history.push(serde_json::to_value(record)?);
        self.set_records(keys::WORKOUT_HISTORY, &history)
    }

    pub fn settings(&self) -> Result<Settings, CoreError> {
        let auto_backup_enabled = self
            .read::<Value>(keys::AUTO_BACKUP_ENABLED)?
            .and_then(|value| value.as_bool())
            .unwrap_or_else(Settings::default_auto_backup_enabled);
        Ok(Settings {
            auto_backup_enabled,
            last_backup_time: self.read_timestamp(keys::LAST_BACKUP_TIME)?,
            last_sync_time: self.read_timestamp(keys::LAST_SYNC_TIME)?,
        })
    }

    pub fn set_auto_backup_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        self.write(keys::AUTO_BACKUP_ENABLED, &enabled)
    }

    pub fn set_last_backup_time(&self, timestamp: DateTime<Utc>) -> Result<(), CoreError> {
        self.write(keys::LAST_BACKUP_TIME, &timestamp)
    }

    pub fn set_last_sync_time(&self, timestamp: DateTime<Utc>) -> Result<(), CoreError> {
        self.write(keys::LAST_SYNC_TIME, &timestamp)
    }

    /// Collects every backed-up key into a complete snapshot payload.
    pub fn snapshot_data(&self) -> Result<SnapshotData, CoreError> {
        let settings = self.settings()?;
        Ok(SnapshotData {
            clients: Some(self.records(keys::CLIENTS)?),
            sessions: Some(self.records(keys::SESSIONS)?),
            custom_workouts: Some(self.records(keys::CUSTOM_WORKOUTS)?),
            workout_history: Some(self.records(keys::WORKOUT_HISTORY)?),
            settings: Some(SnapshotSettings {
                auto_backup_enabled: Some(settings.auto_backup_enabled),
                last_backup_time: settings.last_backup_time,
            }),
        })
    }

    /// Overwrites each list key present in `data` wholesale and leaves absent keys alone.
    /// Returns the keys that were written.
    ///
    /// Every value is serialized before the first write. A store failure part way
    /// through names the keys that had already been replaced.
    pub fn apply_snapshot_data(&self, data: &SnapshotData) -> Result<Vec<&'static str>, CoreError> {
        let lists = [
            (keys::CLIENTS, &data.clients),
            (keys::SESSIONS, &data.sessions),
            (keys::CUSTOM_WORKOUTS, &data.custom_workouts),
            (keys::WORKOUT_HISTORY, &data.workout_history),
        ];
        let mut staged = Vec::new();
        for (key, records) in lists {
            if let Some(records) = records {
                staged.push((key, serde_json::to_string(records)?));
            }
        }
        if let Some(enabled) = data
            .settings
            .as_ref()
            .and_then(|settings| settings.auto_backup_enabled)
        {
            staged.push((keys::AUTO_BACKUP_ENABLED, serde_json::to_string(&enabled)?));
        }

        let mut written: Vec<&'static str> = Vec::with_capacity(staged.len());
        for (key, json) in &staged {
            if let Err(err) = self.store.set(key, json) {
                if written.is_empty() {
                    return Err(err);
                }
                warn!(
                    failed = *key,
                    applied = ?written,
                    error = %err,
                    "snapshot partially applied"
                );
                return Err(CoreError::Storage(format!(
                    "{err} (already replaced: {})",
                    written.join(", ")
                )));
            }
            written.push(*key);
        }
        Ok(written)
    }

    /// Decodes the records that fit `T` and skips the rest; the raw list is untouched.
    fn typed_records<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, CoreError> {
        let records = self.records(key)?;
        let total = records.len();
        let typed: Vec<T> = records
            .into_iter()
            .filter_map(|record| serde_json::from_value(record).ok())
            .collect();
        if typed.len() < total {
            debug!(key, skipped = total - typed.len(), "records without the expected shape");
        }
        Ok(typed)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn read_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, CoreError> {
        Ok(self
            .read::<Value>(key)?
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc)))
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }
}

/// Process-local store, used for tests and for running without a data directory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalStateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| CoreError::Storage("state store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("state store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::Storage("state store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}
