//! coach-core
//!
//! Backup, restore and sync orchestration plus the workout session runner.
//! Depends on coach-domain. No CLI, no terminal I/O; storage and cloud access go
//! through the [`LocalStateStore`] and [`DriveApi`] seams.

pub mod backup_service;
pub mod cloud_client;
pub mod drive;
pub mod error;
pub mod memory_drive;
pub mod naming;
pub mod session_runner;
pub mod state;
pub mod sync;
pub mod time;

pub use backup_service::*;
pub use cloud_client::CloudBackupClient;
pub use drive::{AccessScope, CloudClientFactory, DriveApi, DriveCredentials, DriveFile, FileUpload};
pub use error::{BackupError, CloudError, CoreError};
pub use memory_drive::{DriveStats, MemoryDrive};
pub use session_runner::*;
pub use state::{LocalStateStore, MemoryStateStore, StateRepository};
pub use sync::{newest_wins, SyncDecision};
pub use time::{Clock, ManualClock, SystemClock};
