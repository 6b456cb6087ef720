//! coach-config
//!
//! Persistent settings for the trainer backup tool: cloud credentials, platform tag,
//! auto-backup cadence and directory overrides. Owns the Config data structure plus
//! disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{default_home, CloudSettings, Config, HOME_ENV_VAR};
