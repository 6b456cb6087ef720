use crate::cli::output;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    for (group, entries) in registry.grouped() {
        output::section(group.title());
        for entry in entries {
            output::info(format!("  {:<12} {}", entry.name, entry.summary));
        }
    }
    output::hint("`help <command>` shows usage.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("{} ({})", entry.name, entry.group.title()));
    output::info(format!("  {}", entry.summary));
    output::info(format!("  usage: {}", entry.usage));
}
