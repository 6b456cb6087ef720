//! Line-oriented shell over [`TrainerApp`](crate::TrainerApp).

pub mod commands;
mod context;
mod help;
pub mod output;
mod registry;
mod shell;

pub use context::{CliMode, CommandError, CommandResult, LoopControl, ShellContext};
pub use registry::{CommandEntry, CommandGroup, CommandHandler, CommandRegistry};
pub use shell::{run_cli, SCRIPT_ENV_VAR};
