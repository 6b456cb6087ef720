mod common;

use std::collections::BTreeMap;

use chrono::Duration;
use coach_core::{
    AutoBackupOutcome, AutoBackupSkip, BackupError, Clock, FileUpload, LocalStateStore,
    MemoryDrive, SyncStatus,
};
use coach_core::state::keys;
use coach_domain::{BackupKind, Platform, Snapshot};

use common::{client, seed, Harness};

#[tokio::test]
async fn manual_backup_then_restore_reproduces_local_lists() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    seed(&device.repo);
    let before = device.repo.snapshot_data().expect("read local");

    let receipt = device
        .service
        .create_manual_backup()
        .await
        .expect("manual backup");
    assert!(receipt.file_name.starts_with("workout-tracker-backup-"));
    assert_eq!(
        device.repo.settings().expect("settings").last_backup_time,
        Some(receipt.timestamp)
    );

    device.repo.set_clients(&[]).expect("clear clients");
    device.repo.set_sessions(&[]).expect("clear sessions");
    device.repo.set_custom_workouts(&[]).expect("clear workouts");
    device.repo.set_workout_history(&[]).expect("clear history");

    let report = device
        .service
        .restore_from_backup(&receipt.file_id)
        .await
        .expect("restore");
    assert_eq!(report.timestamp, Some(receipt.timestamp));
    assert_eq!(report.restored.len(), 5);

    let after = device.repo.snapshot_data().expect("read local");
    assert_eq!(after.clients, before.clients);
    assert_eq!(after.sessions, before.sessions);
    assert_eq!(after.custom_workouts, before.custom_workouts);
    assert_eq!(after.workout_history, before.workout_history);
}

#[tokio::test]
async fn partial_snapshot_leaves_missing_keys_untouched() {
    let harness = Harness::new();
    let device = harness.device(Platform::Web);
    let alice = seed(&device.repo);
    device.service.sign_in().await.expect("sign in");
    let folder = device
        .service
        .cloud()
        .ensure_backup_folder()
        .await
        .expect("folder");

    let bob = client("Bob");
    let body = serde_json::json!({
        "timestamp": "2025-03-01T08:00:00.000Z",
        "version": "1.0",
        "data": { "clients": [bob] }
    });
    let file = harness
        .drive
        .insert_file(
            &folder,
            FileUpload {
                name: "workout-tracker-backup-2025-03-01T08-00-00-000Z.json".into(),
                body: body.to_string(),
                properties: BTreeMap::new(),
            },
        )
        .expect("seed partial backup");

    let report = device
        .service
        .restore_from_backup(&file.id)
        .await
        .expect("restore partial");
    assert_eq!(report.restored, vec!["clients"]);

    let clients = device.repo.clients().expect("clients");
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "Bob");
    let sessions = device.repo.sessions().expect("sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].client_id, alice.id);
    assert_eq!(device.repo.workout_history().expect("history").len(), 1);
}

#[tokio::test]
async fn restore_without_data_key_fails_and_writes_nothing() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    device.service.sign_in().await.expect("sign in");
    let folder = device
        .service
        .cloud()
        .ensure_backup_folder()
        .await
        .expect("folder");
    let file = harness
        .drive
        .insert_file(
            &folder,
            FileUpload {
                name: "workout-tracker-backup-broken.json".into(),
                body: r#"{"timestamp":"2025-03-01T08:00:00Z","version":"1.0","clients":[]}"#.into(),
                properties: BTreeMap::new(),
            },
        )
        .expect("seed broken backup");

    let result = device.service.restore_from_backup(&file.id).await;
    assert!(matches!(result, Err(BackupError::InvalidFormat(_))));
    assert_eq!(device.store.writes(), 0);
}

#[tokio::test]
async fn auto_backup_is_rate_limited_to_one_upload_per_hour() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    seed(&device.repo);
    device.service.sign_in().await.expect("sign in");

    let first = device.service.create_auto_backup().await;
    assert!(matches!(first, AutoBackupOutcome::Uploaded(_)));

    harness.clock.advance(Duration::minutes(30));
    let second = device.service.create_auto_backup().await;
    assert!(matches!(
        second,
        AutoBackupOutcome::Skipped(AutoBackupSkip::RateLimited { .. })
    ));
    assert_eq!(harness.drive.stats().uploads, 1);

    harness.clock.advance(Duration::minutes(31));
    let third = device.service.create_auto_backup().await;
    let AutoBackupOutcome::Uploaded(receipt) = third else {
        panic!("expected an upload after the interval, got {:?}", third);
    };
    assert_eq!(
        BackupKind::from_file_name(&receipt.file_name),
        Some(BackupKind::Auto)
    );
    assert_eq!(harness.drive.stats().uploads, 2);
}

#[tokio::test]
async fn auto_backup_when_signed_out_touches_no_network() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    seed(&device.repo);

    let outcome = device.service.create_auto_backup().await;
    assert_eq!(outcome, AutoBackupOutcome::Skipped(AutoBackupSkip::NotSignedIn));

    device.service.initialize().await.expect("initialize");
    let outcome = device.service.create_auto_backup().await;
    assert_eq!(outcome, AutoBackupOutcome::Skipped(AutoBackupSkip::NotSignedIn));
    assert_eq!(harness.drive.stats().network_calls(), 0);
}

#[tokio::test]
async fn auto_backup_respects_the_disabled_flag() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    device.service.sign_in().await.expect("sign in");
    device
        .service
        .set_auto_backup_enabled(false)
        .expect("disable auto-backup");

    let outcome = device.service.create_auto_backup().await;
    assert_eq!(outcome, AutoBackupOutcome::Skipped(AutoBackupSkip::Disabled));
    assert_eq!(harness.drive.stats().uploads, 0);
    assert!(!device.service.backup_status().expect("status").auto_backup_enabled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_auto_backup_reports_through_its_handle() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    device.service.sign_in().await.expect("sign in");

    let outcome = device
        .service
        .spawn_auto_backup()
        .await
        .expect("task completes");
    assert!(matches!(outcome, AutoBackupOutcome::Uploaded(_)));
}

#[tokio::test]
async fn listing_hides_foreign_files() {
    let harness = Harness::new();
    let device = harness.device(Platform::Android);
    device
        .service
        .create_manual_backup()
        .await
        .expect("manual backup");
    let folder = device
        .service
        .cloud()
        .ensure_backup_folder()
        .await
        .expect("folder");
    for name in ["notes.txt", "workout-tracker-backup.txt", "holiday.json"] {
        harness
            .drive
            .insert_file(
                &folder,
                FileUpload {
                    name: name.into(),
                    body: "{}".into(),
                    properties: BTreeMap::new(),
                },
            )
            .expect("seed foreign file");
    }

    let backups = device.service.list_backups().await.expect("list");
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].platform, Platform::Android);
    assert_eq!(backups[0].kind, BackupKind::Manual);
}

#[tokio::test]
async fn sync_without_remote_backups_changes_nothing() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);

    let status = device
        .service
        .force_sync_with_remote()
        .await
        .expect("sync");
    assert_eq!(status, SyncStatus::NoRemoteBackups);
    assert_eq!(device.store.writes(), 0);
}

#[tokio::test]
async fn older_remote_snapshot_is_reported_up_to_date() {
    let harness = Harness::new();
    let phone = harness.device(Platform::Ios);
    seed(&phone.repo);
    phone.service.create_manual_backup().await.expect("phone backup");

    harness.clock.advance(Duration::hours(2));
    let laptop = harness.device(Platform::Desktop);
    laptop
        .repo
        .set_last_sync_time(harness.clock.now())
        .expect("mark laptop synced");
    let writes_before = laptop.store.writes();

    let status = laptop
        .service
        .force_sync_with_remote()
        .await
        .expect("sync");
    assert!(matches!(status, SyncStatus::UpToDate { .. }));
    assert_eq!(laptop.store.writes(), writes_before);
    assert!(laptop.repo.clients().expect("clients").is_empty());
}

#[tokio::test]
async fn newer_remote_snapshot_replaces_local_data() {
    let harness = Harness::new();
    let laptop = harness.device(Platform::Desktop);
    laptop
        .repo
        .set_clients(&[client("Stale")])
        .expect("stale laptop data");
    laptop
        .repo
        .set_last_sync_time(harness.clock.now())
        .expect("mark laptop synced");

    harness.clock.advance(Duration::hours(1));
    let phone = harness.device(Platform::Ios);
    seed(&phone.repo);
    let receipt = phone.service.create_manual_backup().await.expect("phone backup");

    let status = laptop
        .service
        .force_sync_with_remote()
        .await
        .expect("sync");
    let SyncStatus::Merged {
        file_name,
        timestamp,
        ..
    } = status
    else {
        panic!("expected merge, got {:?}", status);
    };
    assert_eq!(file_name, receipt.file_name);
    assert_eq!(timestamp, receipt.timestamp);
    assert_eq!(laptop.repo.clients().expect("clients")[0].name, "Alice");
    assert_eq!(
        laptop.repo.settings().expect("settings").last_sync_time,
        Some(receipt.timestamp)
    );

    let again = laptop
        .service
        .force_sync_with_remote()
        .await
        .expect("second sync");
    assert!(matches!(again, SyncStatus::UpToDate { .. }));
}

#[tokio::test]
async fn backup_list_and_delete_end_to_end() {
    let harness = Harness::new();
    let device = harness.device(Platform::Web);
    let alice = client("Alice");
    device
        .repo
        .set_clients(std::slice::from_ref(&alice))
        .expect("clients");
    device.repo.set_sessions(&[]).expect("sessions");
    device.repo.set_custom_workouts(&[]).expect("workouts");
    device.repo.set_workout_history(&[]).expect("history");
    device.service.sign_in().await.expect("sign in");

    let receipt = device
        .service
        .create_manual_backup()
        .await
        .expect("manual backup");
    assert_eq!(harness.drive.file_names(), vec![receipt.file_name.clone()]);

    let body = device
        .service
        .cloud()
        .download_backup(&receipt.file_id)
        .await
        .expect("download");
    let snapshot: Snapshot = serde_json::from_str(&body).expect("body is a snapshot");
    assert_eq!(snapshot.version, "1.0");
    assert_eq!(snapshot.timestamp, Some(receipt.timestamp));
    assert_eq!(
        snapshot.data.clients,
        Some(vec![serde_json::to_value(&alice).expect("client json")])
    );

    let listed = device.service.list_backups().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.file_id);

    assert!(device.service.delete_backup(&receipt.file_id).await);
    assert!(device.service.list_backups().await.expect("list").is_empty());
    assert!(!device.service.delete_backup(&receipt.file_id).await);
}

#[tokio::test]
async fn declined_sign_in_surfaces_as_auth_error() {
    let harness = Harness::with_drive(MemoryDrive::declining);
    let device = harness.device(Platform::Desktop);

    assert!(matches!(
        device.service.create_manual_backup().await,
        Err(BackupError::Auth(_))
    ));
    assert!(matches!(
        device.service.list_backups().await,
        Err(BackupError::Auth(_))
    ));
    assert!(!device.service.delete_backup("file-1").await);
    assert_eq!(harness.drive.stats().uploads, 0);
}

#[tokio::test]
async fn status_reports_account_and_timestamps() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    let status = device.service.backup_status().expect("status");
    assert!(!status.signed_in);
    assert!(status.auto_backup_enabled);
    assert!(status.user.is_none());

    device.service.create_manual_backup().await.expect("backup");
    let status = device.service.backup_status().expect("status");
    assert!(status.signed_in);
    assert_eq!(status.user.expect("user").name, "Sam Coach");
    assert!(status.last_backup_time.is_some());

    device.service.dispose().await.expect("dispose");
    assert!(!device.service.backup_status().expect("status").signed_in);
}

#[tokio::test]
async fn records_of_any_shape_survive_import_and_backup() {
    let harness = Harness::new();
    let device = harness.device(Platform::Web);
    let clients = r#"[{"id":"1700000000000","name":"A","age":30}]"#;
    let history = r#"[{"id":"1700000000001","clientId":"1700000000000","workoutName":"Legs"}]"#;
    let document = format!(
        r#"{{"timestamp":"2025-03-01T08:00:00.000Z","version":"1.0","data":{{"clients":{clients},"workoutHistory":{history}}}}}"#
    );

    let report = device
        .service
        .import_data_from_str(&document, "legacy.json")
        .expect("import foreign records");
    assert_eq!(report.restored, vec!["clients", "workoutHistory"]);
    assert_eq!(
        device.store.get(keys::CLIENTS).expect("get").as_deref(),
        Some(clients)
    );
    assert_eq!(
        device.store.get(keys::WORKOUT_HISTORY).expect("get").as_deref(),
        Some(history)
    );

    let receipt = device
        .service
        .create_manual_backup()
        .await
        .expect("backup with foreign records");
    let body = device
        .service
        .cloud()
        .download_backup(&receipt.file_id)
        .await
        .expect("download");
    let uploaded: Snapshot = serde_json::from_str(&body).expect("snapshot body");
    assert_eq!(
        serde_json::to_string(&uploaded.data.clients).expect("clients json"),
        clients
    );

    device.repo.set_clients(&[]).expect("clear clients");
    device
        .service
        .restore_from_backup(&receipt.file_id)
        .await
        .expect("restore");
    assert_eq!(
        device.store.get(keys::CLIENTS).expect("get").as_deref(),
        Some(clients)
    );
}

#[tokio::test]
async fn sync_passes_over_an_unreadable_newest_backup() {
    let harness = Harness::new();
    let phone = harness.device(Platform::Ios);
    seed(&phone.repo);
    let receipt = phone.service.create_manual_backup().await.expect("phone backup");

    harness.clock.advance(Duration::hours(1));
    let folder = phone
        .service
        .cloud()
        .ensure_backup_folder()
        .await
        .expect("folder");
    harness
        .drive
        .insert_file(
            &folder,
            FileUpload {
                name: "workout-tracker-backup-2025-03-01T10-00-00-000Z.json".into(),
                body: "{ truncated".into(),
                properties: BTreeMap::new(),
            },
        )
        .expect("seed corrupt backup");

    let laptop = harness.device(Platform::Desktop);
    let status = laptop
        .service
        .force_sync_with_remote()
        .await
        .expect("sync falls back to the readable backup");
    let SyncStatus::Merged { file_name, .. } = status else {
        panic!("expected merge, got {:?}", status);
    };
    assert_eq!(file_name, receipt.file_name);
    assert_eq!(laptop.repo.clients().expect("clients")[0].name, "Alice");
}

#[tokio::test]
async fn sync_reports_the_newest_error_when_nothing_is_readable() {
    let harness = Harness::new();
    let device = harness.device(Platform::Desktop);
    device.service.sign_in().await.expect("sign in");
    let folder = device
        .service
        .cloud()
        .ensure_backup_folder()
        .await
        .expect("folder");
    harness
        .drive
        .insert_file(
            &folder,
            FileUpload {
                name: "workout-tracker-backup-2025-03-01T08-00-00-000Z.json".into(),
                body: r#"{"version":"1.0"}"#.into(),
                properties: BTreeMap::new(),
            },
        )
        .expect("seed backup without data");

    let result = device.service.force_sync_with_remote().await;
    assert!(matches!(result, Err(BackupError::InvalidFormat(_))));
    assert_eq!(device.store.writes(), 0);
}
