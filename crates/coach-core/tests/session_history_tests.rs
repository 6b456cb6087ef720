mod common;

use chrono::Duration;
use coach_core::{SessionRunner, SessionState};
use coach_domain::{Mood, Platform};

use common::{seed, workout, Harness};

#[tokio::test]
async fn completed_session_lands_in_history_and_the_next_backup() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    let alice = seed(&device.repo);

    let mut runner = SessionRunner::from_template(Some(alice.id), &workout(), harness.clock.clone());
    runner.start().expect("start");
    for set in 0..3 {
        runner.toggle_set(0, set).expect("toggle");
        harness.clock.advance(Duration::minutes(4));
    }
    let record = runner
        .complete(Some("Solid pulls".into()), Some(Mood::Good))
        .expect("complete");
    assert_eq!(runner.state(), SessionState::Completed);
    assert_eq!(record.duration_seconds, 12 * 60);

    device.repo.append_history(record.clone()).expect("append");
    let history = device.repo.workout_history().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history.last(), Some(&record));

    let receipt = device
        .service
        .create_manual_backup()
        .await
        .expect("backup");
    device.repo.set_workout_history(&[]).expect("wipe history");
    device
        .service
        .restore_from_backup(&receipt.file_id)
        .await
        .expect("restore");
    let restored = device.repo.workout_history().expect("history");
    assert_eq!(restored.last().map(|entry| entry.completed_set_count()), Some(3));
}

#[test]
fn cancelled_session_produces_no_history() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    let mut runner = SessionRunner::from_template(None, &workout(), harness.clock.clone());
    runner.start().expect("start");
    runner.toggle_set(0, 0).expect("toggle");
    runner.cancel().expect("cancel");

    assert!(runner.complete(None, None).is_err());
    assert!(device.repo.workout_history().expect("history").is_empty());
    assert_eq!(device.store.writes(), 0);
}
