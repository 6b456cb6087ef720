use std::collections::HashMap;

use crate::cli::context::{CommandResult, ShellContext};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Section a command is listed under in `help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandGroup {
    Cloud,
    LocalData,
    Account,
    Shell,
}

impl CommandGroup {
    pub fn title(self) -> &'static str {
        match self {
            CommandGroup::Cloud => "Cloud backups",
            CommandGroup::LocalData => "Local data",
            CommandGroup::Account => "Account",
            CommandGroup::Shell => "Shell",
        }
    }
}

pub struct CommandEntry {
    pub name: &'static str,
    pub group: CommandGroup,
    pub summary: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        group: CommandGroup,
        summary: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            group,
            summary,
            usage,
            handler,
        }
    }
}

/// Commands in registration order, looked up by name or alias.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    lookup: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering a name replaces the earlier entry in place.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.lookup.get(entry.name) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.lookup.insert(entry.name, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Returns `false` when `target` is not registered.
    pub fn alias(&mut self, alias: &'static str, target: &str) -> bool {
        match self.lookup.get(target) {
            Some(&slot) => {
                self.lookup.insert(alias, slot);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.lookup.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    /// Canonical names only.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// Canonical names plus aliases.
    pub fn known_words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.lookup.keys().copied()
    }

    pub fn grouped(&self) -> Vec<(CommandGroup, Vec<&CommandEntry>)> {
        let mut groups: Vec<(CommandGroup, Vec<&CommandEntry>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(group, _)| *group == entry.group) {
                Some((_, members)) => members.push(entry),
                None => groups.push((entry.group, vec![entry])),
            }
        }
        groups.sort_by_key(|(group, _)| *group);
        groups
    }
}
