//! In-process [`DriveApi`] used for offline runs and tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use coach_domain::CloudUser;

use crate::{
    drive::{AccessScope, DriveApi, DriveCredentials, DriveFile, FileUpload},
    time::{Clock, SystemClock},
    CloudError,
};

/// Per-operation call counters. Local status reads are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveStats {
    pub loads: usize,
    pub sign_ins: usize,
    pub folder_lookups: usize,
    pub folders_created: usize,
    pub uploads: usize,
    pub lists: usize,
    pub downloads: usize,
    pub deletes: usize,
}

impl DriveStats {
    /// Calls that would hit the network on a real provider.
    pub fn network_calls(&self) -> usize {
        self.sign_ins
            + self.folder_lookups
            + self.folders_created
            + self.uploads
            + self.lists
            + self.downloads
            + self.deletes
    }
}

#[derive(Debug, Default)]
struct DriveState {
    loaded: bool,
    user: Option<CloudUser>,
    folders: BTreeMap<String, String>,
    files: BTreeMap<String, StoredFile>,
    next_id: u64,
    stats: DriveStats,
}

#[derive(Debug, Clone)]
struct StoredFile {
    folder_id: String,
    meta: DriveFile,
    body: String,
}

pub struct MemoryDrive {
    account: CloudUser,
    accepts_sign_in: bool,
    clock: Arc<dyn Clock>,
    state: Mutex<DriveState>,
}

impl MemoryDrive {
    pub fn new(account: CloudUser) -> Self {
        Self {
            account,
            accepts_sign_in: true,
            clock: Arc::new(SystemClock),
            state: Mutex::new(DriveState::default()),
        }
    }

    /// A drive whose sign-in prompt is always declined.
    pub fn declining(account: CloudUser) -> Self {
        Self {
            accepts_sign_in: false,
            ..Self::new(account)
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn stats(&self) -> DriveStats {
        self.lock().map(|state| state.stats).unwrap_or_default()
    }

    /// Names of every file in every folder, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .map(|state| state.files.values().map(|f| f.meta.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn folder_count(&self) -> usize {
        self.lock().map(|state| state.folders.len()).unwrap_or(0)
    }

    /// Places a file directly into a folder, bypassing sign-in. Used to seed foreign files.
    pub fn insert_file(&self, folder_id: &str, upload: FileUpload) -> Result<DriveFile, CloudError> {
        let mut state = self.lock()?;
        Ok(self.store_file(&mut state, folder_id, upload))
    }

    fn lock(&self) -> Result<MutexGuard<'_, DriveState>, CloudError> {
        self.state
            .lock()
            .map_err(|_| CloudError::Api("memory drive lock poisoned".into()))
    }

    fn ready(&self) -> Result<MutexGuard<'_, DriveState>, CloudError> {
        let state = self.lock()?;
        if !state.loaded {
            return Err(CloudError::NotInitialized);
        }
        if state.user.is_none() {
            return Err(CloudError::NotSignedIn);
        }
        Ok(state)
    }

    fn next_id(state: &mut DriveState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    fn store_file(&self, state: &mut DriveState, folder_id: &str, upload: FileUpload) -> DriveFile {
        let id = Self::next_id(state, "file");
        let now = self.clock.now();
        let meta = DriveFile {
            id: id.clone(),
            name: upload.name,
            created_time: now,
            modified_time: now,
            size: upload.body.len() as u64,
            properties: upload.properties,
        };
        state.files.insert(
            id,
            StoredFile {
                folder_id: folder_id.to_string(),
                meta: meta.clone(),
                body: upload.body,
            },
        );
        meta
    }
}

#[async_trait]
impl DriveApi for MemoryDrive {
    async fn load(
        &self,
        _credentials: &DriveCredentials,
        _scope: AccessScope,
    ) -> Result<(), CloudError> {
        let mut state = self.lock()?;
        state.stats.loads += 1;
        state.loaded = true;
        Ok(())
    }

    async fn sign_in(&self) -> Result<CloudUser, CloudError> {
        let mut state = self.lock()?;
        if !state.loaded {
            return Err(CloudError::NotInitialized);
        }
        state.stats.sign_ins += 1;
        if !self.accepts_sign_in {
            return Err(CloudError::AuthDeclined("user closed the consent prompt".into()));
        }
        state.user = Some(self.account.clone());
        Ok(self.account.clone())
    }

    async fn sign_out(&self) -> Result<(), CloudError> {
        let mut state = self.lock()?;
        state.user = None;
        Ok(())
    }

    fn is_signed_in(&self) -> bool {
        self.lock()
            .map(|state| state.loaded && state.user.is_some())
            .unwrap_or(false)
    }

    fn current_user(&self) -> Option<CloudUser> {
        self.lock().ok().and_then(|state| state.user.clone())
    }

    async fn find_folder(&self, name: &str) -> Result<Option<String>, CloudError> {
        let mut state = self.ready()?;
        state.stats.folder_lookups += 1;
        Ok(state
            .folders
            .iter()
            .find(|(_, folder)| folder.as_str() == name)
            .map(|(id, _)| id.clone()))
    }

    async fn create_folder(&self, name: &str) -> Result<String, CloudError> {
        let mut state = self.ready()?;
        state.stats.folders_created += 1;
        let id = Self::next_id(&mut state, "folder");
        state.folders.insert(id.clone(), name.to_string());
        Ok(id)
    }

    async fn create_file(
        &self,
        folder_id: &str,
        upload: FileUpload,
    ) -> Result<DriveFile, CloudError> {
        let mut state = self.ready()?;
        state.stats.uploads += 1;
        if !state.folders.contains_key(folder_id) {
            return Err(CloudError::NotFound(folder_id.to_string()));
        }
        Ok(self.store_file(&mut state, folder_id, upload))
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, CloudError> {
        let mut state = self.ready()?;
        state.stats.lists += 1;
        Ok(state
            .files
            .values()
            .filter(|file| file.folder_id == folder_id)
            .map(|file| file.meta.clone())
            .collect())
    }

    async fn get_file(&self, file_id: &str) -> Result<String, CloudError> {
        let mut state = self.ready()?;
        state.stats.downloads += 1;
        state
            .files
            .get(file_id)
            .map(|file| file.body.clone())
            .ok_or_else(|| CloudError::NotFound(file_id.to_string()))
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CloudError> {
        let mut state = self.ready()?;
        state.stats.deletes += 1;
        state
            .files
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(file_id.to_string()))
    }
}
