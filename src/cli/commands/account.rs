use crate::cli::{
    context::{CommandResult, ShellContext},
    output,
    registry::{CommandEntry, CommandGroup, CommandRegistry},
};

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register(CommandEntry::new(
        "sign-in",
        CommandGroup::Account,
        "Sign in to the cloud drive",
        "sign-in",
        cmd_sign_in,
    ));
    registry.register(CommandEntry::new(
        "sign-out",
        CommandGroup::Account,
        "Sign out of the cloud drive",
        "sign-out",
        cmd_sign_out,
    ));
}

fn cmd_sign_in(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let user = context.block_on(context.app.backups().sign_in())?;
    output::success(format!("Signed in as {}", user.name));
    Ok(())
}

fn cmd_sign_out(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.block_on(context.app.backups().sign_out())?;
    output::success("Signed out.");
    Ok(())
}
