use crate::cli::{
    context::{CommandError, CommandResult, ShellContext},
    help, output,
    registry::{CommandEntry, CommandGroup, CommandRegistry},
};
use crate::utils::build_info;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "version",
        CommandGroup::Shell,
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new(
        "help",
        CommandGroup::Shell,
        "Show available commands",
        "help [command]",
        cmd_help,
    ));
    registry.register(CommandEntry::new(
        "exit",
        CommandGroup::Shell,
        "Leave the shell",
        "exit",
        cmd_exit,
    ));
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::info(format!("trainer_cli {}", meta.short()));
    output::info(format!("  built:   {}", meta.timestamp));
    output::info(format!("  target:  {} ({})", meta.target, meta.profile));
    output::info(format!("  rustc:   {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => help::print_overview(&context.registry),
        [name] => match context.registry.get(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        },
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: help [command]".into(),
            ))
        }
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
