use std::{collections::BTreeMap, fs, sync::Arc};

use coach_core::{
    AccessScope, CloudBackupClient, CloudClientFactory, CloudError, DriveApi, DriveCredentials,
    FileUpload, LocalStateStore, StateRepository, SystemClock,
};
use coach_domain::{BackupKind, Client, CloudUser, Platform, Snapshot, SnapshotData};
use coach_storage_json::{FolderDrive, FolderDriveFactory, JsonStateStore};
use tempfile::tempdir;

fn coach() -> CloudUser {
    CloudUser {
        name: "Sam Coach".into(),
        email: None,
    }
}

fn upload(name: &str, body: &str) -> FileUpload {
    let mut properties = BTreeMap::new();
    properties.insert("platform".to_string(), "Desktop".to_string());
    FileUpload {
        name: name.into(),
        body: body.into(),
        properties,
    }
}

#[test]
fn state_store_round_trips_keys_as_files() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(JsonStateStore::new(dir.path().join("data")).expect("create store"));
    let repo = StateRepository::new(store.clone());

    assert_eq!(store.get("clients").expect("get"), None);
    repo.set_clients(&[Client::new("Alice")]).expect("write clients");

    let path = store.key_path("clients").expect("key path");
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    assert_eq!(repo.clients().expect("read clients")[0].name, "Alice");

    // A second store over the same directory sees the same data.
    let reopened = JsonStateStore::new(dir.path().join("data")).expect("reopen");
    assert!(reopened.get("clients").expect("get").is_some());

    store.remove("clients").expect("remove");
    store.remove("clients").expect("remove twice");
    assert!(repo.clients().expect("read clients").is_empty());
}

#[test]
fn state_store_rejects_path_like_keys() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStateStore::new(dir.path().to_path_buf()).expect("create store");
    assert!(store.set("../escape", "1").is_err());
    assert!(store.get(".hidden").is_err());
}

#[tokio::test]
async fn folder_drive_stores_files_with_sidecar_metadata() {
    let dir = tempdir().expect("tempdir");
    let drive = FolderDrive::new(dir.path().join("drive"), coach());
    drive
        .load(&DriveCredentials::default(), AccessScope::AppCreatedFiles)
        .await
        .expect("load");
    assert!(matches!(
        drive.find_folder("Backups").await,
        Err(CloudError::NotSignedIn)
    ));
    drive.sign_in().await.expect("sign in");

    assert_eq!(drive.find_folder("Backups").await.expect("find"), None);
    let folder = drive.create_folder("Backups").await.expect("create folder");
    assert_eq!(
        drive.find_folder("Backups").await.expect("find"),
        Some(folder.clone())
    );

    let file = drive
        .create_file(&folder, upload("a.json", "{\"data\":{}}"))
        .await
        .expect("create file");
    assert_eq!(file.id, "Backups/a.json");
    assert_eq!(file.properties.get("platform").map(String::as_str), Some("Desktop"));
    assert!(drive
        .create_file(&folder, upload("a.json", "{}"))
        .await
        .is_err());

    fs::write(dir.path().join("drive/Backups/dropped.json"), "{}").expect("foreign file");
    let files = drive.list_files(&folder).await.expect("list");
    assert_eq!(files.len(), 2);
    let dropped = files
        .iter()
        .find(|file| file.name == "dropped.json")
        .expect("dropped file listed");
    assert!(dropped.properties.is_empty());

    assert_eq!(drive.get_file(&file.id).await.expect("get"), "{\"data\":{}}");
    drive.delete_file(&file.id).await.expect("delete");
    assert!(matches!(
        drive.get_file(&file.id).await,
        Err(CloudError::NotFound(_))
    ));
    assert!(matches!(
        drive.get_file("../../etc/passwd").await,
        Err(CloudError::NotFound(_))
    ));
}

#[tokio::test]
async fn folder_drive_session_survives_reload() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("drive");
    let first = FolderDrive::new(root.clone(), coach());
    first
        .load(&DriveCredentials::default(), AccessScope::AppCreatedFiles)
        .await
        .expect("load");
    first.sign_in().await.expect("sign in");

    let second = FolderDrive::new(root.clone(), coach());
    assert!(!second.is_signed_in());
    second
        .load(&DriveCredentials::default(), AccessScope::AppCreatedFiles)
        .await
        .expect("load");
    assert!(second.is_signed_in());
    assert_eq!(second.current_user().map(|user| user.name), Some("Sam Coach".into()));

    second.sign_out().await.expect("sign out");
    let third = FolderDrive::new(root, coach());
    third
        .load(&DriveCredentials::default(), AccessScope::AppCreatedFiles)
        .await
        .expect("load");
    assert!(!third.is_signed_in());
}

#[tokio::test]
async fn backup_client_over_folder_drive_lists_only_backups() {
    let dir = tempdir().expect("tempdir");
    let factory = FolderDriveFactory::new(dir.path().join("drive"), coach(), Platform::Desktop);
    let client = CloudBackupClient::new(
        factory.create().expect("drive"),
        "WorkoutTracker Backups",
        factory.platform(),
        Arc::new(SystemClock),
    );
    client
        .initialize(&DriveCredentials::default())
        .await
        .expect("initialize");
    client.sign_in().await.expect("sign in");

    let snapshot = Snapshot::new(chrono::Utc::now(), SnapshotData::default());
    let info = client.upload_backup(&snapshot, None).await.expect("upload");
    assert_eq!(info.kind, BackupKind::Manual);
    fs::write(
        dir.path().join("drive/WorkoutTracker Backups/readme.txt"),
        "not a backup",
    )
    .expect("foreign file");

    let listed = client.list_backups().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].platform, Platform::Desktop);
    let body = client.download_backup(&listed[0].id).await.expect("download");
    let parsed: Snapshot = serde_json::from_str(&body).expect("snapshot body");
    assert_eq!(parsed.timestamp, snapshot.timestamp);
}
