#![doc(test(attr(deny(warnings))))]

//! Trainer Core keeps a personal trainer's clients, sessions, workout templates and
//! history on the local device and backs them up to a cloud folder.
//!
//! The domain types live in `coach_domain`, the backup engine and session runner in
//! `coach_core`. This crate wires them to on-disk storage and exposes the CLI.

pub mod app;
pub mod cli;
pub mod errors;
pub mod utils;

pub use app::TrainerApp;
pub use errors::{CliError, TrainerError};

pub mod config {
    pub use coach_config::{
        default_home, CloudSettings, Config, ConfigError, ConfigManager, HOME_ENV_VAR,
    };
}

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Trainer Core tracing initialized.");
    });
}
