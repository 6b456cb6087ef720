//! coach-domain
//!
//! Pure domain models (Client, ScheduledSession, WorkoutTemplate, CompletedSession,
//! Snapshot, backup metadata). No I/O, no CLI, no storage. Only data types and core enums.

pub mod backup;
pub mod client;
pub mod common;
pub mod history;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod workout;

pub use backup::*;
pub use client::*;
pub use common::*;
pub use history::*;
pub use session::*;
pub use settings::*;
pub use snapshot::*;
pub use workout::*;
