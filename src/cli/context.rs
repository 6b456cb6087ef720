//! Shell state, dispatch and error reporting.

use std::{future::Future, io, path::Path};

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

use coach_config::default_home;
use coach_core::{BackupError, CoreError};

use crate::{
    cli::{commands, output, registry::CommandRegistry},
    errors::{CliError, TrainerError},
    TrainerApp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    App(#[from] TrainerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::App(TrainerError::Core(err))
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub app: TrainerApp,
    pub last_command: Option<String>,
    pub running: bool,
    runtime: Runtime,
}

impl ShellContext {
    /// Opens the app under `$TRAINER_CORE_HOME` (or `~/.trainer_core`).
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_home(mode, &default_home())
    }

    pub fn with_home(mode: CliMode, home: &Path) -> Result<Self, CliError> {
        let app = TrainerApp::open(home)?;
        output::apply_config(app.config());
        let runtime = Builder::new_multi_thread().enable_all().build()?;

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let context = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            app,
            last_command: None,
            running: true,
            runtime,
        };

        // Restores a persisted drive session; backup commands retry on demand.
        if let Err(err) = context.block_on(context.app.initialize()) {
            warn!(error = %err, "cloud client did not initialize");
        }
        Ok(context)
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Starts an auto-backup on the shell runtime without waiting for it.
    pub fn spawn_auto_backup(&self) {
        let _guard = self.runtime.enter();
        drop(self.app.backups().spawn_auto_backup());
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.known_words().collect()
    }

    pub fn prompt(&self) -> String {
        let cloud = self.app.backups().cloud();
        match cloud.current_user() {
            Some(user) if cloud.sign_in_status() => format!("trainer ({})> ", user.name),
            _ => "trainer> ".to_string(),
        }
    }

    /// Asks before destructive commands. Script mode only proceeds with `--yes`.
    pub fn confirm_destructive(
        &self,
        prompt: &str,
        assume_yes: bool,
    ) -> Result<bool, CommandError> {
        if assume_yes {
            return Ok(true);
        }
        match self.mode {
            CliMode::Script => Err(CommandError::InvalidArguments(format!(
                "{prompt} Pass --yes to confirm in script mode."
            ))),
            CliMode::Interactive => self.ask(prompt, false),
        }
    }

    fn ask(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    pub fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(self.ask("Exit shell?", true)?)
    }

    pub fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Backup(BackupError::Auth(message))
            | CommandError::App(TrainerError::Backup(BackupError::Auth(message))) => {
                output::error(format!("Sign-in required: {message}"));
                output::hint("Run `sign-in` and try again.");
            }
            other => {
                let hint = backup_hint(&other);
                output::error(other);
                if let Some(hint) = hint {
                    output::hint(hint);
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = crate::cli::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some((raw, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }
}

/// Hint for a backup failure that left local data alone, raised directly or through the app.
fn backup_hint(err: &CommandError) -> Option<&'static str> {
    let backup = match err {
        CommandError::Backup(err) | CommandError::App(TrainerError::Backup(err)) => err,
        _ => return None,
    };
    matches!(backup, BackupError::InvalidFormat(_) | BackupError::Parse(_))
        .then_some("Local data was left untouched.")
}

#[cfg(test)]
pub(crate) fn process_script(home: &Path, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut context = ShellContext::with_home(CliMode::Script, home)?;
    for line in lines {
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_domain::Client;
    use tempfile::tempdir;

    #[test]
    fn parse_line_handles_quotes() {
        let tokens = crate::cli::shell::parse_command_line("import \"my export.json\" --yes")
            .expect("parse");
        assert_eq!(tokens, vec!["import", "my export.json", "--yes"]);
    }

    #[test]
    fn script_backup_then_sync_reports_up_to_date() {
        let home = tempdir().expect("tempdir");
        let context = process_script(home.path(), &["sign-in", "backup", "sync", "exit"])
            .expect("script runs");

        let backups = context
            .block_on(context.app.backups().list_backups())
            .expect("list");
        assert_eq!(backups.len(), 1);
        let status = context.app.backups().backup_status().expect("status");
        assert!(status.signed_in);
        assert!(status.last_backup_time.is_some());
        // A backup taken here is never newer than the local sync point.
        assert!(status.last_sync_time.is_none());
    }

    #[test]
    fn restore_in_script_mode_requires_yes() {
        let home = tempdir().expect("tempdir");
        let mut context = process_script(home.path(), &["backup"]).expect("script runs");
        let id = context
            .block_on(context.app.backups().list_backups())
            .expect("list")[0]
            .id
            .clone();
        context
            .app
            .state()
            .set_clients(&[Client::new("Local only")])
            .expect("seed");

        let refused = context.process_line(&format!("restore \"{id}\""));
        assert!(matches!(refused, Err(CommandError::InvalidArguments(_))));
        assert_eq!(context.app.state().clients().expect("clients").len(), 1);

        context
            .process_line(&format!("restore \"{id}\" --yes"))
            .expect("restore");
        assert!(context.app.state().clients().expect("clients").is_empty());
    }

    #[test]
    fn format_errors_get_the_untouched_hint_however_they_arrive() {
        let direct = CommandError::Backup(BackupError::InvalidFormat("missing `data` key".into()));
        let wrapped =
            CommandError::App(TrainerError::Backup(BackupError::Parse("bad json".into())));
        let expected = Some("Local data was left untouched.");
        assert_eq!(backup_hint(&direct), expected);
        assert_eq!(backup_hint(&wrapped), expected);
        assert_eq!(
            backup_hint(&CommandError::App(TrainerError::Runtime("boom".into()))),
            None
        );
    }

    #[test]
    fn exit_command_stops_the_loop() {
        let home = tempdir().expect("tempdir");
        let mut context = ShellContext::with_home(CliMode::Script, home.path()).expect("context");
        assert_eq!(context.process_line("exit").expect("exit"), LoopControl::Exit);
        assert_eq!(
            context.process_line("").expect("blank"),
            LoopControl::Continue
        );
    }
}
