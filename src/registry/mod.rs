//! Command registry
//!
//! Stores command definitions by name, in registration order, and validates
//! phase references against the declared phase plan.

pub mod command;
pub mod phase;

pub use command::*;
pub use phase::*;

use crate::error::{RegistryError, RegistryResult};
use std::collections::HashMap;

/// Command definitions, keyed by name, in registration order
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; re-registering the same name overwrites.
    ///
    /// Fails when the command (or an inline cycle member) references a phase
    /// absent from the declared plan. Inline cycle members are registered as
    /// commands of their own and rewritten to by-name references.
    pub fn register(&mut self, mut cmd: Command, plan: Option<&PhasePlan>) -> RegistryResult<()> {
        if let (Some(plan), Some(phase)) = (plan, &cmd.phase) {
            plan.check(phase, &cmd.name)?;
        }

        if let Action::Cycle(cycle) = &mut cmd.action {
            let members = std::mem::take(&mut cycle.members);
            let mut resolved = Vec::with_capacity(members.len());
            let mut inline = Vec::new();
            for member in members {
                match member {
                    CommandRef::ByName(name) => resolved.push(CommandRef::ByName(name)),
                    CommandRef::Inline(command) => {
                        resolved.push(CommandRef::ByName(command.name.clone()));
                        inline.push(*command);
                    }
                }
            }
            cycle.members = resolved;
            for command in inline {
                self.register(command, plan)?;
            }
        }

        if let Some(&slot) = self.index.get(&cmd.name) {
            self.commands[slot] = cmd;
        } else {
            self.index.insert(cmd.name.clone(), self.commands.len());
            self.commands.push(cmd);
        }
        Ok(())
    }

    /// Attach a cycle to an already-registered command
    pub fn add_cycle(
        &mut self,
        name: &str,
        cycle: Cycle,
        plan: Option<&PhasePlan>,
    ) -> RegistryResult<()> {
        if !self.index.contains_key(name) {
            return Err(RegistryError::UnknownCommand(name.to_string()));
        }
        // reuse register's inline-member resolution by rebuilding the command
        let mut cmd = self.get(name)?.clone();
        cmd.action = Action::Cycle(cycle);
        self.register(cmd, plan)
    }

    /// Look up a command by name
    pub fn get(&self, name: &str) -> RegistryResult<&Command> {
        self.index
            .get(name)
            .map(|&slot| &self.commands[slot])
            .ok_or_else(|| RegistryError::UnknownCommand(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All commands, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Validate every registered command's phase against a plan
    pub fn validate_phases(&self, plan: &PhasePlan) -> RegistryResult<()> {
        for cmd in &self.commands {
            if let Some(phase) = &cmd.phase {
                plan.check(phase, &cmd.name)?;
            }
        }
        Ok(())
    }

    /// Clear the registry, for test isolation
    pub fn reset(&mut self) {
        self.commands.clear();
        self.index.clear();
    }
}
