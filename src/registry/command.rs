//! Command and cycle definitions
//!
//! Commands are the named actions an application registers; a cycle turns a
//! command into a repeat-loop over a list of member commands.

use crate::engine::RunContext;
use crate::error::ExecutionResult;
use std::fmt;
use std::rc::Rc;

/// Command action handler
pub type ActionFn = Rc<dyn Fn(&mut RunContext) -> ExecutionResult<()>>;

/// Cycle lifecycle hook
pub type Hook = Rc<dyn Fn(&mut RunContext) -> ExecutionResult<()>>;

/// Cycle continuation condition
pub type Condition = Rc<dyn Fn(&mut RunContext) -> ExecutionResult<bool>>;

/// What a command does when it runs: an ordinary action, or a cycle
#[derive(Clone)]
pub enum Action {
    Run(ActionFn),
    Cycle(Cycle),
}

/// A command definition
#[derive(Clone)]
pub struct Command {
    /// Unique command name
    pub name: String,

    /// Usage description for command listings
    pub about: Option<String>,

    /// The action to run
    pub action: Action,

    /// Execution phase; `None` uses the declared default phase
    pub phase: Option<String>,

    /// Commands this one prefers to precede, when queued together
    pub goes_before: Vec<String>,

    /// Commands this one prefers to follow, when queued together
    pub goes_after: Vec<String>,

    /// Commands that must have completed earlier in the same run;
    /// inserted into the queue automatically when absent
    pub require_before: Vec<String>,

    /// Commands appended to the queue after this one completes
    pub next_commands: Vec<String>,

    /// Parameters that must have a resolved value before this command runs
    pub required_params: Vec<String>,

    /// Parameter whose being-set auto-queues this command
    pub trigger_param: Option<String>,

    /// Framework-provided command (introspection only)
    pub framework: bool,

    /// Hidden from command listings (introspection only)
    pub exclude_from_help: bool,
}

impl Command {
    /// Create a new command with a no-op action
    pub fn new(name: impl Into<String>) -> Self {
        Command {
            name: name.into(),
            about: None,
            action: Action::Run(Rc::new(|_| Ok(()))),
            phase: None,
            goes_before: Vec::new(),
            goes_after: Vec::new(),
            require_before: Vec::new(),
            next_commands: Vec::new(),
            required_params: Vec::new(),
            trigger_param: None,
            framework: false,
            exclude_from_help: false,
        }
    }

    /// Set the usage description
    pub fn about(mut self, text: impl Into<String>) -> Self {
        self.about = Some(text.into());
        self
    }

    /// Set the action handler
    pub fn run<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<()> + 'static,
    {
        self.action = Action::Run(Rc::new(action));
        self
    }

    /// Attach a cycle instead of an ordinary action
    pub fn cycle(mut self, cycle: Cycle) -> Self {
        self.action = Action::Cycle(cycle);
        self
    }

    /// Assign an execution phase
    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Prefer to precede the named commands when queued together
    pub fn goes_before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goes_before.extend(names.into_iter().map(Into::into));
        self
    }

    /// Prefer to follow the named commands when queued together
    pub fn goes_after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goes_after.extend(names.into_iter().map(Into::into));
        self
    }

    /// Require the named commands to have completed earlier in the run
    pub fn require_before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_before.extend(names.into_iter().map(Into::into));
        self
    }

    /// Queue the named commands after this one completes
    pub fn next_commands<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_commands.extend(names.into_iter().map(Into::into));
        self
    }

    /// Require the named parameters to be resolved before running
    pub fn required_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_params.extend(names.into_iter().map(Into::into));
        self
    }

    /// Auto-queue this command whenever the named parameter is set
    pub fn trigger_param(mut self, name: impl Into<String>) -> Self {
        self.trigger_param = Some(name.into());
        self
    }

    /// Mark as a framework-provided command
    pub fn framework(mut self) -> Self {
        self.framework = true;
        self
    }

    /// Hide from command listings
    pub fn hidden(mut self) -> Self {
        self.exclude_from_help = true;
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("goes_before", &self.goes_before)
            .field("goes_after", &self.goes_after)
            .field("require_before", &self.require_before)
            .field("next_commands", &self.next_commands)
            .field("required_params", &self.required_params)
            .field("trigger_param", &self.trigger_param)
            .finish_non_exhaustive()
    }
}

/// A reference to a cycle member command
///
/// Inline definitions are registered and rewritten to `ByName` when the
/// owning command is registered.
#[derive(Clone)]
pub enum CommandRef {
    ByName(String),
    Inline(Box<Command>),
}

impl CommandRef {
    pub fn name(&self) -> &str {
        match self {
            CommandRef::ByName(name) => name,
            CommandRef::Inline(cmd) => &cmd.name,
        }
    }
}

/// A repeat-loop attached to a command
///
/// Lifecycle: `init` once, then `loop_condition` before every iteration
/// (including the first); while true, `loop_start`, the member commands in
/// list order, then `loop_end`; finally `end` exactly once, even when a
/// member or hook fails. All loop state lives in parameter values or caller
/// closures; the cycle itself holds none.
#[derive(Clone)]
pub struct Cycle {
    /// Cycle name, for reporting
    pub name: String,

    /// Runs once before the first condition check
    pub init: Option<Hook>,

    /// Evaluated at the top of every iteration; false ends the loop
    pub loop_condition: Condition,

    /// Runs at the start of each iteration, before the members
    pub loop_start: Option<Hook>,

    /// Runs at the end of each iteration, after the members
    pub loop_end: Option<Hook>,

    /// Runs exactly once when the cycle finishes or aborts
    pub end: Option<Hook>,

    /// Member commands, executed once per iteration in list order
    pub members: Vec<CommandRef>,
}

impl Cycle {
    /// Create a new cycle; the default condition is false, so a cycle
    /// without one runs only its init and end hooks
    pub fn new(name: impl Into<String>) -> Self {
        Cycle {
            name: name.into(),
            init: None,
            loop_condition: Rc::new(|_| Ok(false)),
            loop_start: None,
            loop_end: None,
            end: None,
            members: Vec::new(),
        }
    }

    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<()> + 'static,
    {
        self.init = Some(Rc::new(hook));
        self
    }

    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<bool> + 'static,
    {
        self.loop_condition = Rc::new(condition);
        self
    }

    pub fn loop_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<()> + 'static,
    {
        self.loop_start = Some(Rc::new(hook));
        self
    }

    pub fn loop_end<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<()> + 'static,
    {
        self.loop_end = Some(Rc::new(hook));
        self
    }

    pub fn end<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RunContext) -> ExecutionResult<()> + 'static,
    {
        self.end = Some(Rc::new(hook));
        self
    }

    /// Add a member command by name
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(CommandRef::ByName(name.into()));
        self
    }

    /// Add an inline member command definition
    pub fn member_inline(mut self, command: Command) -> Self {
        self.members.push(CommandRef::Inline(Box::new(command)));
        self
    }

    /// Member command names, in list order
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }
}

impl fmt::Debug for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cycle")
            .field("name", &self.name)
            .field("members", &self.member_names())
            .finish_non_exhaustive()
    }
}
