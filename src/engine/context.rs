//! Execution context for command running
//!
//! The context tracks all the state a run needs: the parameter registry,
//! the prompter, the persisted store, and the stack of commands being
//! executed.

use crate::error::{ExecutionError, ExecutionResult, ParamError};
use crate::params::interpolate::interpolate;
use crate::params::prompt::{ConsolePrompter, Prompter};
use crate::params::registry::ParamRegistry;
use crate::params::store::ParamStore;
use crate::ui;

/// Default prompt retry ceiling when neither the run nor the parameter
/// overrides it
pub const DEFAULT_PROMPT_RETRIES: u32 = 3;

/// Execution context that tracks state during a run
pub struct RunContext {
    /// Parameter definitions and resolved values
    pub params: ParamRegistry,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Prompter for on-demand parameter input
    prompter: Box<dyn Prompter>,

    /// Persisted store for persist-flagged parameters
    store: Option<ParamStore>,

    /// Stack of commands being executed (for detecting recursion)
    command_stack: Vec<String>,

    /// Prompt retry ceiling for parameters without their own override
    prompt_retries: u32,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl RunContext {
    /// Create a new context with a console prompter and default settings
    pub fn new(params: ParamRegistry) -> Self {
        RunContext {
            params,
            verbosity: Verbosity::Normal,
            prompter: Box::new(ConsolePrompter),
            store: None,
            command_stack: Vec::new(),
            prompt_retries: DEFAULT_PROMPT_RETRIES,
        }
    }

    /// Replace the prompter
    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// Attach a persisted store
    pub fn with_store(mut self, store: Option<ParamStore>) -> Self {
        self.store = store;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the default prompt retry ceiling
    pub fn with_prompt_retries(mut self, attempts: u32) -> Self {
        self.prompt_retries = attempts.max(1);
        self
    }

    /// Take the parameter registry out of a finished run
    pub fn into_params(self) -> ParamRegistry {
        self.params
    }

    /// Push a command onto the execution stack
    pub fn push_command(&mut self, name: String) {
        self.command_stack.push(name);
    }

    /// Pop a command from the execution stack
    pub fn pop_command(&mut self) -> Option<String> {
        self.command_stack.pop()
    }

    /// Check if a command is in the execution stack (detect recursion)
    pub fn is_running(&self, name: &str) -> bool {
        self.command_stack.iter().any(|c| c == name)
    }

    /// Current command name (top of stack)
    pub fn current_command(&self) -> Option<&String> {
        self.command_stack.last()
    }

    /// Whether the named parameter can be prompted for
    pub fn can_prompt(&self, name: &str) -> bool {
        self.params.def(name).map_or(false, |d| d.prompt.is_some())
    }

    /// Prompt for a parameter value, re-prompting on invalid typed input up
    /// to the retry ceiling
    ///
    /// A value obtained here is set in the registry, so later commands that
    /// require the same parameter never prompt again.
    pub fn prompt_param(&mut self, name: &str) -> ExecutionResult<()> {
        let def = self
            .params
            .def(name)
            .cloned()
            .ok_or_else(|| ParamError::UnknownParam(name.to_string()))?;
        let spec = def
            .prompt
            .clone()
            .ok_or_else(|| ParamError::MissingParam(def.name.clone()))?;

        let text = interpolate(&spec.text, &self.params.string_map())
            .unwrap_or_else(|_| spec.text.clone());
        let attempts = spec.retries.unwrap_or(self.prompt_retries).max(1);

        for _ in 0..attempts {
            let line = self.prompter.prompt(&text, spec.sensitive)?;
            match def.kind.parse(&def.name, line.trim()) {
                Ok(value) => {
                    self.params.set(&def.name, value);
                    return Ok(());
                }
                Err(err) => self.print_error(&err.to_string()),
            }
        }

        Err(ExecutionError::RetriesExhausted {
            param: def.name.clone(),
            attempts,
        })
    }

    /// Write dirty persist-flagged parameters back to the store
    pub fn flush_persist(&mut self) -> ExecutionResult<()> {
        if let Some(store) = &self.store {
            if self.params.has_dirty_persistent() {
                let snapshot = self.params.persist_snapshot();
                store
                    .save(&snapshot)
                    .map_err(|e| ExecutionError::Persist(e.to_string()))?;
                self.params.clear_dirty();
            }
        }
        Ok(())
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            ui::info(message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            ui::error(message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            ui::debug(message);
        }
    }

    /// Print command start message
    pub fn print_command_start(&self, name: &str) {
        if self.verbosity >= Verbosity::Normal {
            ui::run(name);
        }
    }

    /// Print command completion message
    pub fn print_command_complete(&self, name: &str) {
        if self.verbosity >= Verbosity::Verbose {
            ui::done(name);
        }
    }
}
