//! Run-levels
//!
//! A run-level is an ordered segment of an invocation with its own parameter
//! scope, command scope, config overlay, and optional error handler.
//! Declared levels execute strictly in order; with none declared, a single
//! implicit level holds everything.

use crate::error::ExecutionError;
use std::rc::Rc;

/// Handler outcome for a per-command execution error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Suppress the error; the command is treated as completed
    Recovered,
    /// Propagate the error; the remaining queue is aborted
    Reraise,
}

/// Per-run-level error handler
pub type ErrorHandler = Rc<dyn Fn(&ExecutionError) -> Recovery>;

/// An ordered segment of a run
#[derive(Clone)]
pub struct RunLevel {
    name: String,
    params: Vec<String>,
    commands: Vec<String>,
    overlay: Vec<(String, String)>,
    handler: Option<ErrorHandler>,
    default: bool,
}

impl RunLevel {
    pub fn new(name: impl Into<String>) -> Self {
        RunLevel {
            name: name.into(),
            params: Vec::new(),
            commands: Vec::new(),
            overlay: Vec::new(),
            handler: None,
            default: false,
        }
    }

    /// Scope a parameter to this level's parsing pass
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    /// Scope several parameters to this level
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(names.into_iter().map(Into::into));
        self
    }

    /// Scope a command to this level
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.commands.push(name.into());
        self
    }

    /// Scope several commands to this level
    pub fn commands<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a config overlay entry, applied before this level's parsing pass
    ///
    /// Values may reference already-resolved parameters with `${param}`.
    pub fn overlay(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overlay.push((key.into(), value.into()));
        self
    }

    /// Install a custom error handler for this level's commands
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExecutionError) -> Recovery + 'static,
    {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Mark this level as the home of unscoped commands and parameters
    pub fn default_level(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scoped_params(&self) -> &[String] {
        &self.params
    }

    pub fn scoped_commands(&self) -> &[String] {
        &self.commands
    }

    pub fn overlay_pairs(&self) -> &[(String, String)] {
        &self.overlay
    }

    pub fn handler(&self) -> Option<ErrorHandler> {
        self.handler.clone()
    }

    pub fn is_default(&self) -> bool {
        self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_level_builder() {
        let level = RunLevel::new("config")
            .param("profile")
            .commands(["load-config", "check-config"])
            .overlay("profile", "release")
            .default_level();

        assert_eq!(level.name(), "config");
        assert_eq!(level.scoped_params(), ["profile"]);
        assert_eq!(level.scoped_commands(), ["load-config", "check-config"]);
        assert_eq!(
            level.overlay_pairs(),
            [("profile".to_string(), "release".to_string())]
        );
        assert!(level.is_default());
        assert!(level.handler().is_none());
    }

    #[test]
    fn test_on_error_handler() {
        let level = RunLevel::new("exec").on_error(|_| Recovery::Recovered);
        let handler = level.handler().unwrap();
        let err = ExecutionError::RecursiveCommand("x".to_string());
        assert_eq!((*handler)(&err), Recovery::Recovered);
    }
}
