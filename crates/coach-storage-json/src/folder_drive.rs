use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coach_core::{
    AccessScope, Clock, CloudClientFactory, CloudError, DriveApi, DriveCredentials, DriveFile,
    FileUpload, SystemClock,
};
use coach_domain::{CloudUser, Platform};

use crate::{is_plain_segment, write_atomic};

const META_DIR: &str = ".meta";
const SESSION_FILE: &str = ".session.json";

/// Sidecar metadata kept next to each uploaded file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMeta {
    created_time: DateTime<Utc>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Session {
    loaded: bool,
    user: Option<CloudUser>,
}

/// Cloud drive backed by a directory, typically one kept in sync by a desktop
/// client. Folders are subdirectories; a file id is `<folder>/<file name>`.
///
/// The signed-in account is remembered in a session file at the drive root so it
/// survives restarts, like a cached OAuth token.
pub struct FolderDrive {
    root: PathBuf,
    account: CloudUser,
    clock: Arc<dyn Clock>,
    session: RwLock<Session>,
}

impl FolderDrive {
    pub fn new(root: PathBuf, account: CloudUser) -> Self {
        Self {
            root,
            account,
            clock: Arc::new(SystemClock),
            session: RwLock::new(Session::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    fn folder_path(&self, folder_id: &str) -> Result<PathBuf, CloudError> {
        if !is_plain_segment(folder_id) {
            return Err(CloudError::Api(format!("invalid folder name `{}`", folder_id)));
        }
        Ok(self.root.join(folder_id))
    }

    /// Splits `<folder>/<file name>` and rejects anything that would escape the root.
    fn resolve(&self, file_id: &str) -> Result<(PathBuf, String), CloudError> {
        let (folder, name) = file_id
            .split_once('/')
            .filter(|(folder, name)| is_plain_segment(folder) && is_plain_segment(name))
            .ok_or_else(|| CloudError::NotFound(file_id.to_string()))?;
        Ok((self.root.join(folder), name.to_string()))
    }

    fn meta_path(folder: &Path, name: &str) -> PathBuf {
        folder.join(META_DIR).join(format!("{}.json", name))
    }

    fn ready(&self) -> Result<(), CloudError> {
        let session = self
            .session
            .read()
            .map_err(|_| CloudError::Api("drive session lock poisoned".into()))?;
        if !session.loaded {
            return Err(CloudError::NotInitialized);
        }
        if session.user.is_none() {
            return Err(CloudError::NotSignedIn);
        }
        Ok(())
    }

    fn describe(&self, folder_id: &str, path: &Path) -> Result<Option<DriveFile>, CloudError> {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return Ok(None);
        };
        if !path.is_file() || !is_plain_segment(name) || name.ends_with(".tmp") {
            return Ok(None);
        }
        let fs_meta = fs::metadata(path)?;
        let modified_time: DateTime<Utc> = fs_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| self.clock.now());
        let sidecar = match fs::read_to_string(Self::meta_path(path.parent().unwrap_or(path), name)) {
            Ok(raw) => serde_json::from_str::<FileMeta>(&raw).ok(),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        let (created_time, properties) = match sidecar {
            Some(meta) => (meta.created_time, meta.properties),
            None => (modified_time, BTreeMap::new()),
        };
        Ok(Some(DriveFile {
            id: format!("{}/{}", folder_id, name),
            name: name.to_string(),
            created_time,
            modified_time,
            size: fs_meta.len(),
            properties,
        }))
    }
}

#[async_trait]
impl DriveApi for FolderDrive {
    async fn load(
        &self,
        _credentials: &DriveCredentials,
        scope: AccessScope,
    ) -> Result<(), CloudError> {
        fs::create_dir_all(&self.root)?;
        let remembered = match fs::read_to_string(self.session_path()) {
            Ok(raw) => serde_json::from_str::<CloudUser>(&raw).ok(),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        let mut session = self
            .session
            .write()
            .map_err(|_| CloudError::Api("drive session lock poisoned".into()))?;
        session.loaded = true;
        session.user = remembered;
        debug!(root = %self.root.display(), scope = scope.as_str(), "folder drive loaded");
        Ok(())
    }

    async fn sign_in(&self) -> Result<CloudUser, CloudError> {
        let body = serde_json::to_string_pretty(&self.account)
            .map_err(|err| CloudError::Serde(err.to_string()))?;
        let mut session = self
            .session
            .write()
            .map_err(|_| CloudError::Api("drive session lock poisoned".into()))?;
        if !session.loaded {
            return Err(CloudError::NotInitialized);
        }
        write_atomic(&self.session_path(), &body)?;
        session.user = Some(self.account.clone());
        info!(user = %self.account.name, "folder drive session opened");
        Ok(self.account.clone())
    }

    async fn sign_out(&self) -> Result<(), CloudError> {
        let mut session = self
            .session
            .write()
            .map_err(|_| CloudError::Api("drive session lock poisoned".into()))?;
        session.user = None;
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn is_signed_in(&self) -> bool {
        self.session
            .read()
            .map(|session| session.loaded && session.user.is_some())
            .unwrap_or(false)
    }

    fn current_user(&self) -> Option<CloudUser> {
        self.session
            .read()
            .ok()
            .and_then(|session| session.user.clone())
    }

    async fn find_folder(&self, name: &str) -> Result<Option<String>, CloudError> {
        self.ready()?;
        let path = self.folder_path(name)?;
        Ok(path.is_dir().then(|| name.to_string()))
    }

    async fn create_folder(&self, name: &str) -> Result<String, CloudError> {
        self.ready()?;
        let path = self.folder_path(name)?;
        fs::create_dir_all(path.join(META_DIR))?;
        Ok(name.to_string())
    }

    async fn create_file(
        &self,
        folder_id: &str,
        upload: FileUpload,
    ) -> Result<DriveFile, CloudError> {
        self.ready()?;
        let folder = self.folder_path(folder_id)?;
        if !folder.is_dir() {
            return Err(CloudError::NotFound(folder_id.to_string()));
        }
        if !is_plain_segment(&upload.name) {
            return Err(CloudError::Api(format!("invalid file name `{}`", upload.name)));
        }
        let path = folder.join(&upload.name);
        if path.exists() {
            return Err(CloudError::Api(format!("file `{}` already exists", upload.name)));
        }
        let meta = FileMeta {
            created_time: self.clock.now(),
            properties: upload.properties,
        };
        let meta_json =
            serde_json::to_string_pretty(&meta).map_err(|err| CloudError::Serde(err.to_string()))?;
        write_atomic(&Self::meta_path(&folder, &upload.name), &meta_json)?;
        write_atomic(&path, &upload.body)?;
        self.describe(folder_id, &path)?
            .ok_or_else(|| CloudError::Api(format!("file `{}` vanished after upload", upload.name)))
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, CloudError> {
        self.ready()?;
        let folder = self.folder_path(folder_id)?;
        if !folder.is_dir() {
            return Err(CloudError::NotFound(folder_id.to_string()));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&folder)? {
            if let Some(file) = self.describe(folder_id, &entry?.path())? {
                files.push(file);
            }
        }
        Ok(files)
    }

    async fn get_file(&self, file_id: &str) -> Result<String, CloudError> {
        self.ready()?;
        let (folder, name) = self.resolve(file_id)?;
        match fs::read_to_string(folder.join(&name)) {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(CloudError::NotFound(file_id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CloudError> {
        self.ready()?;
        let (folder, name) = self.resolve(file_id)?;
        match fs::remove_file(folder.join(&name)) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CloudError::NotFound(file_id.to_string()))
            }
            Err(err) => return Err(err.into()),
        }
        match fs::remove_file(Self::meta_path(&folder, &name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Hands out [`FolderDrive`]s rooted at one directory.
#[derive(Debug, Clone)]
pub struct FolderDriveFactory {
    root: PathBuf,
    account: CloudUser,
    platform: Platform,
}

impl FolderDriveFactory {
    pub fn new(root: PathBuf, account: CloudUser, platform: Platform) -> Self {
        Self {
            root,
            account,
            platform,
        }
    }
}

impl CloudClientFactory for FolderDriveFactory {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn create(&self) -> Result<Arc<dyn DriveApi>, CloudError> {
        Ok(Arc::new(FolderDrive::new(
            self.root.clone(),
            self.account.clone(),
        )))
    }
}
