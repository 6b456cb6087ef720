mod account;
mod backup;
mod data;
mod system;

use chrono::{DateTime, Utc};

use crate::cli::{context::CommandError, registry::CommandRegistry};

pub fn register_all(registry: &mut CommandRegistry) {
    backup::register(registry);
    data::register(registry);
    account::register(registry);
    system::register(registry);

    registry.alias("ls", "backups");
    registry.alias("quit", "exit");
    registry.alias("?", "help");
}

const YES_FLAG: &str = "--yes";

/// Splits `--yes` out of the positional arguments.
fn take_yes_flag<'a>(args: &[&'a str]) -> (Vec<&'a str>, bool) {
    let yes = args.iter().any(|arg| *arg == YES_FLAG);
    let rest = args.iter().copied().filter(|arg| *arg != YES_FLAG).collect();
    (rest, yes)
}

fn single_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    match args {
        [value] => Ok(value),
        _ => Err(CommandError::InvalidArguments(format!("usage: {usage}"))),
    }
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
