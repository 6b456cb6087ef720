//! The backup document uploaded to the cloud and written by manual export.
//!
//! Every key of [`SnapshotData`] is optional on the way in: a partial snapshot only
//! overwrites the keys it carries. Snapshots built from local state always carry all
//! of them.
//!
//! List records are kept as raw JSON. Their shape belongs to whoever wrote them, so a
//! backup carries unknown fields and foreign id formats through untouched.

use chrono::{DateTime, Utc};
use serde::{de::Deserializer, Deserialize, Serialize};
use serde_json::Value;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default = "Snapshot::default_version")]
    pub version: String,
    pub data: SnapshotData,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>, data: SnapshotData) -> Self {
        Self {
            timestamp: Some(timestamp),
            version: Self::default_version(),
            data,
        }
    }

    pub fn default_version() -> String {
        SNAPSHOT_VERSION.into()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_workouts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_history: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SnapshotSettings>,
}

impl SnapshotData {
    /// Names of the list keys present in this payload, in wire order.
    pub fn present_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.clients.is_some() {
            keys.push("clients");
        }
        if self.sessions.is_some() {
            keys.push("sessions");
        }
        if self.custom_workouts.is_some() {
            keys.push("customWorkouts");
        }
        if self.workout_history.is_some() {
            keys.push("workoutHistory");
        }
        keys
    }
}

/// Settings subset carried inside a snapshot.
///
/// Values of the wrong JSON type are read as absent instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSettings {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub auto_backup_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_backup_time: Option<DateTime<Utc>>,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}
