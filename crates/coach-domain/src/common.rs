//! Shared traits and value types used across trainer records.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exposes a stable identifier for records kept in the local state store.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to a record's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Linear lookup; the lists involved are small and unindexed.
pub fn find_by_id<T: Identifiable>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

/// Reps, load and rest for a single set. Used for both planned and actual values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetValues {
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub rest_seconds: u32,
}

impl SetValues {
    pub fn new(reps: u32, weight: f64, rest_seconds: u32) -> Self {
        Self {
            reps,
            weight,
            rest_seconds,
        }
    }

    pub fn has_rest(&self) -> bool {
        self.rest_seconds > 0
    }
}

impl fmt::Display for SetValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} (rest {}s)",
            self.reps, self.weight, self.rest_seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Client;

    #[test]
    fn find_by_id_matches_on_identifier() {
        let clients = vec![Client::new("Alice"), Client::new("Bob")];
        let bob = clients[1].id;

        assert_eq!(find_by_id(&clients, bob).map(NamedEntity::name), Some("Bob"));
        assert!(find_by_id(&clients, Uuid::new_v4()).is_none());
    }
}
