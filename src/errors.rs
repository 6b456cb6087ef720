use coach_config::ConfigError;
use coach_core::{BackupError, CloudError, CoreError};
use thiserror::Error;

/// Top-level error for the application layer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<std::io::Error> for TrainerError {
    fn from(err: std::io::Error) -> Self {
        TrainerError::Core(CoreError::Io(err))
    }
}

/// User-facing CLI error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] TrainerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Input(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_keep_their_message() {
        let err: TrainerError = BackupError::from(CloudError::NotSignedIn).into();
        assert!(matches!(err, TrainerError::Backup(BackupError::Auth(_))));
        assert!(err.to_string().contains("Sign-in required"));
    }

    #[test]
    fn io_errors_land_in_core() {
        let err: TrainerError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, TrainerError::Core(CoreError::Io(_))));
    }
}
