//! Workout templates built from the exercise library.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, NamedEntity, SetValues};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub exercises: Vec<PlannedExercise>,
}

impl WorkoutTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            exercises: Vec::new(),
        }
    }

    pub fn with_exercise(mut self, exercise: PlannedExercise) -> Self {
        self.exercises.push(exercise);
        self
    }
}

impl Identifiable for WorkoutTemplate {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for WorkoutTemplate {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An exercise slot inside a template with its planned sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetValues>,
}

impl PlannedExercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exercise_id: None,
            sets: Vec::new(),
        }
    }

    /// Appends `count` identical sets.
    pub fn with_sets(mut self, count: usize, plan: SetValues) -> Self {
        self.sets.extend(std::iter::repeat(plan).take(count));
        self
    }
}
