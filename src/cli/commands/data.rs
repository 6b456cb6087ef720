use std::path::{Path, PathBuf};

use coach_core::state::keys;
use coach_domain::{find_by_id, NamedEntity};

use crate::cli::{
    context::{CommandError, CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandGroup, CommandRegistry},
};

use super::{format_time, single_arg, take_yes_flag};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "export",
        CommandGroup::LocalData,
        "Write all local data to a JSON file",
        "export [dir]",
        cmd_export,
    ));
    registry.register(CommandEntry::new(
        "import",
        CommandGroup::LocalData,
        "Overwrite local data from an exported JSON file",
        "import <file> [--yes]",
        cmd_import,
    ));
    registry.register(CommandEntry::new(
        "status",
        CommandGroup::LocalData,
        "Show sign-in, auto-backup and local data status",
        "status",
        cmd_status,
    ));
    registry.register(CommandEntry::new(
        "auto",
        CommandGroup::LocalData,
        "Turn auto-backup on or off",
        "auto <on|off>",
        cmd_auto,
    ));
    registry.register(CommandEntry::new(
        "history",
        CommandGroup::LocalData,
        "List completed workout sessions",
        "history",
        cmd_history,
    ));
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let dir = match args {
        [] => context.app.export_dir(),
        [dir] => PathBuf::from(dir),
        _ => return Err(CommandError::InvalidArguments("usage: export [dir]".into())),
    };
    let file_name = context.app.backups().export_data_as_file(&dir)?;
    output::success(format!("Exported {}", dir.join(file_name).display()));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (rest, yes) = take_yes_flag(args);
    let path = Path::new(single_arg(&rest, "import <file> [--yes]")?);
    if !path.is_file() {
        return Err(CommandError::InvalidArguments(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let prompt = format!(
        "Import `{}`? This overwrites all local training data.",
        path.display()
    );
    if !context.confirm_destructive(&prompt, yes)? {
        output::info("Import cancelled.");
        return Ok(());
    }

    let report = context.app.backups().import_data_from_file(path)?;
    output::success(&report.message);
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let status = context.app.backups().backup_status()?;
    let cloud = context.app.backups().cloud();

    output::section("Backup status");
    let account = match (&status.user, status.signed_in) {
        (Some(user), true) => match &user.email {
            Some(email) => format!("yes ({} <{}>)", user.name, email),
            None => format!("yes ({})", user.name),
        },
        _ => "no".to_string(),
    };
    output::info(format!("  Signed in:    {account}"));
    output::info(format!(
        "  Auto-backup:  {}",
        if status.auto_backup_enabled { "on" } else { "off" }
    ));
    output::info(format!("  Last backup:  {}", format_time(status.last_backup_time)));
    output::info(format!("  Last sync:    {}", format_time(status.last_sync_time)));
    output::info(format!("  Folder:       {}", cloud.folder_name()));
    output::info(format!("  Platform:     {}", cloud.platform()));

    let state = context.app.state();
    output::section("Local data");
    let counts = [
        ("Clients:         ", keys::CLIENTS),
        ("Sessions:        ", keys::SESSIONS),
        ("Custom workouts: ", keys::CUSTOM_WORKOUTS),
        ("History entries: ", keys::WORKOUT_HISTORY),
    ];
    for (label, key) in counts {
        output::info(format!("  {} {}", label, state.records(key)?.len()));
    }
    Ok(())
}

fn cmd_auto(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let enabled = match single_arg(args, "auto <on|off>")?.to_ascii_lowercase().as_str() {
        "on" => true,
        "off" => false,
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "expected `on` or `off`, got `{other}`"
            )))
        }
    };
    context.app.backups().set_auto_backup_enabled(enabled)?;
    output::success(format!(
        "Auto-backup {}.",
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}

fn cmd_history(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let history = context.app.state().workout_history()?;
    let clients = context.app.state().clients()?;
    if history.is_empty() {
        output::info("No completed sessions yet.");
        return Ok(());
    }

    output::section(format!("Workout history ({})", history.len()));
    for record in history.iter().rev() {
        let client = record
            .client_id
            .and_then(|id| find_by_id(&clients, id))
            .map(NamedEntity::name)
            .unwrap_or("-");
        output::info(format!(
            "  {}  {:<16} {}  {} min  {} sets",
            format_time(Some(record.completed_at)),
            client,
            record.workout_name,
            record.duration_seconds / 60,
            record.completed_set_count()
        ));
    }
    Ok(())
}
