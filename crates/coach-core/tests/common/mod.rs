#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{TimeZone, Utc};
use coach_core::{
    cloud_client::DEFAULT_FOLDER_NAME, BackupService, CloudBackupClient, CoreError,
    DriveCredentials, LocalStateStore, ManualClock, MemoryDrive, MemoryStateStore,
    StateRepository,
};
use coach_domain::{
    Client, CloudUser, CompletedSession, ExerciseRecord, Platform, ScheduledSession, SetRecord,
    SetValues, WorkoutTemplate, PlannedExercise,
};
use uuid::Uuid;

/// Memory store that counts writes so tests can assert nothing was touched.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStateStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocalStateStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

pub struct Device {
    pub store: Arc<CountingStore>,
    pub repo: StateRepository,
    pub service: Arc<BackupService>,
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub drive: Arc<MemoryDrive>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_drive(MemoryDrive::new)
    }

    pub fn with_drive(build: impl FnOnce(CloudUser) -> MemoryDrive) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let drive = Arc::new(build(coach()).with_clock(clock.clone()));
        Self { clock, drive }
    }

    /// A device with its own local store sharing the drive and the clock.
    pub fn device(&self, platform: Platform) -> Device {
        let store = Arc::new(CountingStore::default());
        let repo = StateRepository::new(store.clone());
        let cloud = Arc::new(CloudBackupClient::new(
            self.drive.clone(),
            DEFAULT_FOLDER_NAME,
            platform,
            self.clock.clone(),
        ));
        let service = Arc::new(BackupService::new(
            cloud,
            repo.clone(),
            self.clock.clone(),
            DriveCredentials {
                api_key: "test-key".into(),
                client_id: "test-client".into(),
            },
        ));
        Device {
            store,
            repo,
            service,
        }
    }
}

pub fn coach() -> CloudUser {
    CloudUser {
        name: "Sam Coach".into(),
        email: Some("sam@example.com".into()),
    }
}

pub fn client(name: &str) -> Client {
    Client::new(name).with_email(format!("{}@example.com", name.to_lowercase()))
}

pub fn workout() -> WorkoutTemplate {
    WorkoutTemplate::new("Full body")
        .with_exercise(PlannedExercise::new("Deadlift").with_sets(3, SetValues::new(5, 120.0, 120)))
}

pub fn history_entry(client_id: Uuid) -> CompletedSession {
    let started = Utc.with_ymd_and_hms(2025, 2, 20, 17, 0, 0).unwrap();
    CompletedSession {
        id: Uuid::new_v4(),
        client_id: Some(client_id),
        workout_name: "Full body".into(),
        started_at: started,
        completed_at: started + chrono::Duration::minutes(50),
        duration_seconds: 50 * 60,
        exercises: vec![ExerciseRecord {
            name: "Deadlift".into(),
            exercise_id: None,
            sets: vec![SetRecord::from_plan(SetValues::new(5, 120.0, 120))],
        }],
        notes: None,
        mood: None,
    }
}

/// Fills every list key with one record.
pub fn seed(repo: &StateRepository) -> Client {
    let alice = client("Alice");
    repo.set_clients(std::slice::from_ref(&alice)).expect("seed clients");
    let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date");
    repo.set_sessions(&[ScheduledSession::new(alice.id, date)])
        .expect("seed sessions");
    repo.set_custom_workouts(&[workout()]).expect("seed workouts");
    repo.set_workout_history(&[history_entry(alice.id)])
        .expect("seed history");
    alice
}
