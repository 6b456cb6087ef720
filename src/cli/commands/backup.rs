use coach_core::{AutoBackupOutcome, AutoBackupSkip, SyncStatus};

use crate::cli::{
    context::{CommandError, CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandGroup, CommandRegistry},
};

use super::{format_time, single_arg, take_yes_flag};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "backup",
        CommandGroup::Cloud,
        "Upload a manual backup of all local data",
        "backup",
        cmd_backup,
    ));
    registry.register(CommandEntry::new(
        "auto-backup",
        CommandGroup::Cloud,
        "Run the auto-backup now if it is due",
        "auto-backup",
        cmd_auto_backup,
    ));
    registry.register(CommandEntry::new(
        "backups",
        CommandGroup::Cloud,
        "List backups in the cloud folder, newest first",
        "backups",
        cmd_list,
    ));
    registry.register(CommandEntry::new(
        "restore",
        CommandGroup::Cloud,
        "Overwrite local data with a cloud backup",
        "restore <id|#> [--yes]",
        cmd_restore,
    ));
    registry.register(CommandEntry::new(
        "delete",
        CommandGroup::Cloud,
        "Delete a cloud backup",
        "delete <id|#>",
        cmd_delete,
    ));
    registry.register(CommandEntry::new(
        "sync",
        CommandGroup::Cloud,
        "Apply the newest cloud backup if it is newer than local data",
        "sync",
        cmd_sync,
    ));
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.is_empty() {
        return Err(CommandError::InvalidArguments("usage: backup".into()));
    }
    let receipt = context.block_on(context.app.backups().create_manual_backup())?;
    output::success(format!("Backup created: {}", receipt.file_name));
    output::info(format!("  id: {}", receipt.file_id));
    Ok(())
}

fn cmd_auto_backup(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.block_on(context.app.backups().create_auto_backup()) {
        AutoBackupOutcome::Uploaded(receipt) => {
            output::success(format!("Auto-backup uploaded: {}", receipt.file_name));
        }
        AutoBackupOutcome::Skipped(AutoBackupSkip::Disabled) => {
            output::info("Auto-backup is off. Use `auto on` to enable it.");
        }
        AutoBackupOutcome::Skipped(AutoBackupSkip::RateLimited { next_due }) => {
            output::info(format!(
                "Auto-backup not due until {}.",
                format_time(Some(next_due))
            ));
        }
        AutoBackupOutcome::Skipped(AutoBackupSkip::NotSignedIn) => {
            output::info("Auto-backup skipped: not signed in.");
        }
        AutoBackupOutcome::Failed(_) => {
            output::warning("Auto-backup did not complete; see the log for details.");
        }
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.block_on(context.app.backups().list_backups())?;
    if backups.is_empty() {
        output::info("No backups found.");
        return Ok(());
    }

    output::section(format!("Backups ({})", backups.len()));
    for (index, info) in backups.iter().enumerate() {
        output::info(format!(
            "  {:>2}. {}  [{}] {}  {}  {} B",
            index + 1,
            info.name,
            info.kind,
            info.platform,
            format_time(Some(info.created_time)),
            info.size
        ));
        output::info(format!("      id: {}", info.id));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (rest, yes) = take_yes_flag(args);
    let target = single_arg(&rest, "restore <id|#> [--yes]")?;
    let file_id = resolve_backup_id(context, target)?;

    let prompt = format!("Restore `{file_id}`? This overwrites all local training data.");
    if !context.confirm_destructive(&prompt, yes)? {
        output::info("Restore cancelled.");
        return Ok(());
    }

    let report = context.block_on(context.app.backups().restore_from_backup(&file_id))?;
    output::success(&report.message);
    if !report.restored.is_empty() {
        output::info(format!("  restored: {}", report.restored.join(", ")));
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = single_arg(args, "delete <id|#>")?;
    let file_id = resolve_backup_id(context, target)?;
    if context.block_on(context.app.backups().delete_backup(&file_id)) {
        output::success(format!("Deleted {file_id}"));
        Ok(())
    } else {
        Err(CommandError::Message(format!(
            "Could not delete {file_id}; see the log for details."
        )))
    }
}

fn cmd_sync(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.block_on(context.app.backups().force_sync_with_remote())? {
        SyncStatus::Merged {
            file_name,
            timestamp,
            restored,
        } => {
            output::success(format!(
                "Merged {file_name} ({})",
                format_time(Some(timestamp))
            ));
            output::info(format!("  restored: {}", restored.join(", ")));
        }
        SyncStatus::UpToDate { remote_timestamp } => {
            output::info(format!(
                "Local data is up to date (newest backup {}).",
                format_time(Some(remote_timestamp))
            ));
        }
        SyncStatus::NoRemoteBackups => output::info("No remote backups found."),
    }
    Ok(())
}

/// `#3` or `3` picks from the current listing; anything else is a file id.
fn resolve_backup_id(context: &ShellContext, target: &str) -> Result<String, CommandError> {
    let Ok(position) = target.trim_start_matches('#').parse::<usize>() else {
        return Ok(target.to_string());
    };
    let backups = context.block_on(context.app.backups().list_backups())?;
    position
        .checked_sub(1)
        .and_then(|index| backups.get(index))
        .map(|info| info.id.clone())
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "No backup #{position}; `backups` lists {} entries.",
                backups.len()
            ))
        })
}
