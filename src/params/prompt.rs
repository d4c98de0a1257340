//! Interactive parameter prompting
//!
//! The run context asks a [`Prompter`] for a single line of input whenever a
//! command requires a parameter that has no resolved value and the parameter
//! declares a prompt. Typed validation and the retry loop live in the run
//! context; a prompter only performs one read.

use crate::error::{ExecutionError, ExecutionResult};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use std::collections::VecDeque;

/// A single-attempt line reader
pub trait Prompter {
    /// Read one line of input; `sensitive` suppresses echo
    fn prompt(&mut self, text: &str, sensitive: bool) -> ExecutionResult<String>;
}

/// Console prompter backed by dialoguer
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn prompt(&mut self, text: &str, sensitive: bool) -> ExecutionResult<String> {
        let theme = ColorfulTheme::default();
        let result = if sensitive {
            Password::with_theme(&theme)
                .with_prompt(text)
                .allow_empty_password(true)
                .interact()
        } else {
            Input::<String>::with_theme(&theme)
                .with_prompt(text)
                .allow_empty(true)
                .interact_text()
        };
        result.map_err(|e| ExecutionError::PromptFailed(e.to_string()))
    }
}

/// Prompter fed from a fixed list of responses, for tests and non-interactive
/// embedding
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    responses: VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, _text: &str, _sensitive: bool) -> ExecutionResult<String> {
        self.responses
            .pop_front()
            .ok_or_else(|| ExecutionError::PromptFailed("scripted input exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompter_pops_in_order() {
        let mut prompter = ScriptedPrompter::new(["first", "second"]);
        assert_eq!(prompter.prompt("x", false).unwrap(), "first");
        assert_eq!(prompter.prompt("x", true).unwrap(), "second");
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_scripted_prompter_exhausted() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let result = prompter.prompt("x", false);
        assert!(matches!(result, Err(ExecutionError::PromptFailed(_))));
    }
}
