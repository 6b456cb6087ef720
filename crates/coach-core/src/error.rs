use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

/// Failures reported by a cloud drive implementation.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Cloud client is not initialized")]
    NotInitialized,
    #[error("Not signed in to the cloud drive")]
    NotSignedIn,
    #[error("Sign-in declined: {0}")]
    AuthDeclined(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Cloud API error: {0}")]
    Api(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    pub fn is_auth(&self) -> bool {
        matches!(self, CloudError::NotSignedIn | CloudError::AuthDeclined(_))
    }
}

/// Error surface of the backup service. Raw drive errors never escape untranslated.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Sign-in required: {0}")]
    Auth(String),
    #[error(transparent)]
    Cloud(CloudError),
    #[error("Invalid backup format: {0}")]
    InvalidFormat(String),
    #[error("Could not parse backup: {0}")]
    Parse(String),
    #[error(transparent)]
    Store(#[from] CoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CloudError> for BackupError {
    fn from(err: CloudError) -> Self {
        if err.is_auth() {
            BackupError::Auth(err.to_string())
        } else {
            BackupError::Cloud(err)
        }
    }
}
