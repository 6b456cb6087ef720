//! Walks a trainer through one planned workout, set by set.
//!
//! The runner owns no persistence. [`SessionRunner::complete`] hands back a
//! [`CompletedSession`] for the caller to append to the workout history, and
//! [`SessionRunner::cancel`] drops everything.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use coach_domain::{
    CompletedSession, ExerciseRecord, Mood, PlannedExercise, SetRecord, SetValues,
    WorkoutTemplate,
};

use crate::{time::Clock, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress => "in progress",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Advisory rest timer started by completing a set. Nothing waits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestCountdown {
    pub exercise_index: usize,
    pub set_index: usize,
    pub duration_seconds: u32,
    pub started_at: DateTime<Utc>,
}

impl RestCountdown {
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = Duration::seconds(i64::from(self.duration_seconds)) - (now - self.started_at);
        left.max(Duration::zero())
    }
}

pub struct SessionRunner {
    client_id: Option<Uuid>,
    workout_name: String,
    exercises: Vec<ExerciseRecord>,
    clock: Arc<dyn Clock>,
    state: SessionState,
    current: usize,
    started_at: Option<DateTime<Utc>>,
    /// Elapsed time banked by earlier running stretches.
    banked: Duration,
    running_since: Option<DateTime<Utc>>,
    rest: Option<RestCountdown>,
}

impl SessionRunner {
    pub fn new(
        client_id: Option<Uuid>,
        workout_name: impl Into<String>,
        exercises: Vec<PlannedExercise>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let exercises = exercises
            .into_iter()
            .map(|planned| ExerciseRecord {
                name: planned.name,
                exercise_id: planned.exercise_id,
                sets: planned.sets.into_iter().map(SetRecord::from_plan).collect(),
            })
            .collect();
        Self {
            client_id,
            workout_name: workout_name.into(),
            exercises,
            clock,
            state: SessionState::NotStarted,
            current: 0,
            started_at: None,
            banked: Duration::zero(),
            running_since: None,
            rest: None,
        }
    }

    pub fn from_template(
        client_id: Option<Uuid>,
        template: &WorkoutTemplate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            client_id,
            template.name.clone(),
            template.exercises.clone(),
            clock,
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn workout_name(&self) -> &str {
        &self.workout_name
    }

    pub fn exercises(&self) -> &[ExerciseRecord] {
        &self.exercises
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_exercise(&self) -> Option<&ExerciseRecord> {
        self.exercises.get(self.current)
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::InProgress && self.running_since.is_none()
    }

    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.state != SessionState::NotStarted {
            return Err(invalid(format!("cannot start a session that is {}", self.state)));
        }
        let now = self.clock.now();
        self.state = SessionState::InProgress;
        self.started_at = Some(now);
        self.running_since = Some(now);
        Ok(())
    }

    /// Moves forward one exercise, stopping at the last one.
    pub fn next_exercise(&mut self) -> Result<usize, CoreError> {
        self.require_in_progress()?;
        let last = self.exercises.len().saturating_sub(1);
        self.current = (self.current + 1).min(last);
        Ok(self.current)
    }

    /// Moves back one exercise, stopping at the first one.
    pub fn previous_exercise(&mut self) -> Result<usize, CoreError> {
        self.require_in_progress()?;
        self.current = self.current.saturating_sub(1);
        Ok(self.current)
    }

    /// Flips a set's completed flag. Marking it done with a rest value starts a new
    /// countdown, replacing any running one; unmarking leaves the countdown alone.
    pub fn toggle_set(
        &mut self,
        exercise: usize,
        set: usize,
    ) -> Result<Option<RestCountdown>, CoreError> {
        self.require_in_progress()?;
        let record = self.set_mut(exercise, set)?;
        record.completed = !record.completed;
        if !record.completed || !record.actual.has_rest() {
            return Ok(None);
        }
        let countdown = RestCountdown {
            exercise_index: exercise,
            set_index: set,
            duration_seconds: record.actual.rest_seconds,
            started_at: self.clock.now(),
        };
        self.rest = Some(countdown);
        Ok(Some(countdown))
    }

    pub fn update_actual(
        &mut self,
        exercise: usize,
        set: usize,
        values: SetValues,
    ) -> Result<(), CoreError> {
        self.require_in_progress()?;
        self.set_mut(exercise, set)?.actual = values;
        Ok(())
    }

    /// Stops the elapsed counter. Exercise position is untouched.
    pub fn pause(&mut self) -> Result<(), CoreError> {
        self.require_in_progress()?;
        if let Some(since) = self.running_since.take() {
            self.banked = self.banked + (self.clock.now() - since);
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CoreError> {
        self.require_in_progress()?;
        if self.running_since.is_none() {
            self.running_since = Some(self.clock.now());
        }
        Ok(())
    }

    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.banked + (self.clock.now() - since),
            None => self.banked,
        }
    }

    /// Time left on the running rest countdown, `None` once it has run out or was skipped.
    pub fn rest_remaining(&self) -> Option<Duration> {
        let remaining = self.rest?.remaining(self.clock.now());
        (remaining > Duration::zero()).then_some(remaining)
    }

    pub fn skip_rest(&mut self) {
        self.rest = None;
    }

    /// Freezes the session and packages it for the workout history.
    pub fn complete(
        &mut self,
        notes: Option<String>,
        mood: Option<Mood>,
    ) -> Result<CompletedSession, CoreError> {
        self.require_in_progress()?;
        self.pause()?;
        let completed_at = self.clock.now();
        self.state = SessionState::Completed;
        self.rest = None;
        let duration_seconds = u64::try_from(self.banked.num_seconds()).unwrap_or(0);
        Ok(CompletedSession {
            id: Uuid::new_v4(),
            client_id: self.client_id,
            workout_name: self.workout_name.clone(),
            started_at: self.started_at.unwrap_or(completed_at),
            completed_at,
            duration_seconds,
            exercises: self.exercises.clone(),
            notes: notes.filter(|text| !text.trim().is_empty()),
            mood,
        })
    }

    /// Discards all progress. Nothing is recorded.
    pub fn cancel(&mut self) -> Result<(), CoreError> {
        match self.state {
            SessionState::NotStarted | SessionState::InProgress => {
                self.state = SessionState::Cancelled;
                self.exercises.clear();
                self.current = 0;
                self.rest = None;
                self.running_since = None;
                self.banked = Duration::zero();
                Ok(())
            }
            other => Err(invalid(format!("cannot cancel a session that is {}", other))),
        }
    }

    fn require_in_progress(&self) -> Result<(), CoreError> {
        if self.state == SessionState::InProgress {
            Ok(())
        } else {
            Err(invalid(format!("session is {}", self.state)))
        }
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut SetRecord, CoreError> {
        self.exercises
            .get_mut(exercise)
            .and_then(|record| record.sets.get_mut(set))
            .ok_or_else(|| invalid(format!("no set {} in exercise {}", set, exercise)))
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidOperation(message)
}
