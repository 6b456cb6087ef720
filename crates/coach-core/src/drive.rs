//! Vendor-neutral cloud drive seam.
//!
//! A [`DriveApi`] implementation speaks to one storage provider. The backup client only
//! needs folder lookup/creation plus create/list/get/delete of files inside one folder.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use coach_domain::{CloudUser, Platform};

use crate::CloudError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DriveCredentials {
    pub api_key: String,
    pub client_id: String,
}

/// OAuth scope requested at load time. Only files created by this app are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    AppCreatedFiles,
}

impl AccessScope {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessScope::AppCreatedFiles => "drive.file",
        }
    }
}

/// File metadata as reported by the drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub size: u64,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub body: String,
    pub properties: BTreeMap<String, String>,
}

#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Prepares the provider SDK with the app credentials. Called once per client.
    async fn load(&self, credentials: &DriveCredentials, scope: AccessScope)
        -> Result<(), CloudError>;
    async fn sign_in(&self) -> Result<CloudUser, CloudError>;
    async fn sign_out(&self) -> Result<(), CloudError>;
    fn is_signed_in(&self) -> bool;
    fn current_user(&self) -> Option<CloudUser>;
    async fn find_folder(&self, name: &str) -> Result<Option<String>, CloudError>;
    async fn create_folder(&self, name: &str) -> Result<String, CloudError>;
    async fn create_file(&self, folder_id: &str, upload: FileUpload)
        -> Result<DriveFile, CloudError>;
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, CloudError>;
    async fn get_file(&self, file_id: &str) -> Result<String, CloudError>;
    async fn delete_file(&self, file_id: &str) -> Result<(), CloudError>;
}

/// Builds the drive implementation for the platform the app runs on.
pub trait CloudClientFactory: Send + Sync {
    fn platform(&self) -> Platform;
    fn create(&self) -> Result<Arc<dyn DriveApi>, CloudError>;
}
