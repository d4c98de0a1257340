//! Queue execution
//!
//! Drains a resolved sequence one command at a time, growing the pending
//! queue from `next_commands` chains and trigger parameters discovered at
//! run time, and expanding prerequisites of dynamically queued commands.

use crate::engine::context::RunContext;
use crate::engine::cycle;
use crate::engine::resolver;
use crate::engine::runlevel::{ErrorHandler, Recovery};
use crate::error::{ExecutionError, ExecutionResult, ResolveError};
use crate::registry::{Action, Command, CommandRegistry};
use std::collections::{HashSet, VecDeque};

/// Executes resolved command sequences against a registry
pub struct Executor<'r> {
    registry: &'r CommandRegistry,
    handler: Option<ErrorHandler>,
    completed: HashSet<String>,
    completed_order: Vec<String>,
}

impl<'r> Executor<'r> {
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Executor {
            registry,
            handler: None,
            completed: HashSet::new(),
            completed_order: Vec::new(),
        }
    }

    /// Set the error handler applied to command failures
    pub fn set_handler(&mut self, handler: Option<ErrorHandler>) {
        self.handler = handler;
    }

    /// Whether a command has completed in this run
    pub fn is_completed(&self, name: &str) -> bool {
        self.completed.contains(name)
    }

    /// Completed commands, in completion order (duplicates kept)
    pub fn completed_order(&self) -> &[String] {
        &self.completed_order
    }

    /// Run a resolved sequence to completion
    pub fn execute(&mut self, sequence: Vec<String>, ctx: &mut RunContext) -> ExecutionResult<()> {
        let mut pending: VecDeque<String> = sequence.into();
        self.drain(&mut pending, ctx)
    }

    /// Run a cycle's member commands, once each in list order, through the
    /// same queue machinery as an isolated sub-queue
    pub(crate) fn execute_members(
        &mut self,
        members: &[String],
        ctx: &mut RunContext,
    ) -> ExecutionResult<()> {
        let mut pending: VecDeque<String> = members.iter().cloned().collect();
        self.drain(&mut pending, ctx)
    }

    fn drain(&mut self, pending: &mut VecDeque<String>, ctx: &mut RunContext) -> ExecutionResult<()> {
        while let Some(name) = pending.pop_front() {
            let registry = self.registry;
            let cmd = registry.get(&name).map_err(ResolveError::from)?;

            // A command that entered the queue at run time may still have
            // unmet requirements; expand them in front of it and retry.
            if cmd
                .require_before
                .iter()
                .any(|p| !self.completed.contains(p))
            {
                let chain = resolver::expand_runtime(registry, &name, &self.completed)?;
                for item in chain.into_iter().rev() {
                    pending.push_front(item);
                }
                continue;
            }

            self.run_command(cmd, ctx, pending)?;
        }
        Ok(())
    }

    fn run_command(
        &mut self,
        cmd: &'r Command,
        ctx: &mut RunContext,
        pending: &mut VecDeque<String>,
    ) -> ExecutionResult<()> {
        let name = cmd.name.clone();
        ctx.print_command_start(&name);

        let outcome = if ctx.is_running(&name) {
            Err(ExecutionError::RecursiveCommand(name.clone()))
        } else {
            match check_required_params(cmd, ctx) {
                Err(err) => Err(err),
                Ok(()) => {
                    ctx.push_command(name.clone());
                    let result = match &cmd.action {
                        Action::Run(action) => (**action)(ctx),
                        Action::Cycle(cycle) => cycle::drive(cycle, self, ctx),
                    };
                    ctx.pop_command();
                    result
                }
            }
        };

        if let Err(err) = outcome {
            match self.recover(&err) {
                Recovery::Recovered => {
                    ctx.print_debug(&format!("Error in '{}' suppressed by handler: {}", name, err))
                }
                Recovery::Reraise => return Err(err),
            }
        }

        self.completed.insert(name.clone());
        self.completed_order.push(name.clone());
        ctx.print_command_complete(&name);

        // Chained commands dedup against the completed set only; explicit
        // requests may legitimately queue the same command twice.
        for next in &cmd.next_commands {
            if self.completed.contains(next) {
                continue;
            }
            pending.push_back(next.clone());
        }

        // A parameter set during execution may auto-queue its command.
        for candidate in self.registry.iter() {
            let Some(trigger) = &candidate.trigger_param else {
                continue;
            };
            if ctx.params.is_set(trigger)
                && !self.completed.contains(&candidate.name)
                && !pending.contains(&candidate.name)
            {
                ctx.print_debug(&format!(
                    "Parameter '{}' queued command '{}'",
                    trigger, candidate.name
                ));
                pending.push_back(candidate.name.clone());
            }
        }

        ctx.flush_persist()?;
        Ok(())
    }

    fn recover(&self, err: &ExecutionError) -> Recovery {
        match &self.handler {
            Some(handler) => (**handler)(err),
            None => Recovery::Reraise,
        }
    }
}

/// Verify required parameters, prompting where the definition allows it
fn check_required_params(cmd: &Command, ctx: &mut RunContext) -> ExecutionResult<()> {
    let mut missing = Vec::new();
    for param in &cmd.required_params {
        if ctx.params.is_set(param) {
            continue;
        }
        if ctx.can_prompt(param) {
            ctx.prompt_param(param)?;
        } else {
            missing.push(param.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExecutionError::MissingRequiredParam {
            command: cmd.name.clone(),
            missing: missing.join(", "),
        })
    }
}
