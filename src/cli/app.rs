//! Application facade
//!
//! `App` ties the registries, the phase plan, and the run-levels together,
//! builds the clap command for the CLI surface, and drives resolution and
//! execution.

use crate::engine::context::{RunContext, Verbosity, DEFAULT_PROMPT_RETRIES};
use crate::engine::executor::Executor;
use crate::engine::resolver::resolve;
use crate::engine::runlevel::RunLevel;
use crate::error::{CadreError, Result};
use crate::params::interpolate::interpolate;
use crate::params::prompt::{ConsolePrompter, Prompter};
use crate::params::registry::ParamRegistry;
use crate::params::store::ParamStore;
use crate::params::types::{ParamDef, ValueKind};
use crate::registry::{Command, CommandRegistry, Cycle, PhasePlan};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use clap_complete::Shell;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// A command-line application built on the framework
pub struct App {
    name: String,
    version: Option<String>,
    about: Option<String>,
    commands: CommandRegistry,
    params: ParamRegistry,
    phases: Option<PhasePlan>,
    run_levels: Vec<RunLevel>,
    store_path: Option<PathBuf>,
    prompter: Option<Box<dyn Prompter>>,
    prompt_retries: u32,
    verbosity: Verbosity,
}

/// What a finished run produced: the completed commands in completion order
/// and the final parameter registry
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub completed: Vec<String>,
    pub params: ParamRegistry,
}

impl App {
    /// Create a new application
    pub fn new(name: impl Into<String>) -> Self {
        App {
            name: name.into(),
            version: None,
            about: None,
            commands: CommandRegistry::new(),
            params: ParamRegistry::new(),
            phases: None,
            run_levels: Vec::new(),
            store_path: None,
            prompter: None,
            prompt_retries: DEFAULT_PROMPT_RETRIES,
            verbosity: Verbosity::Normal,
        }
    }

    /// Set the version shown by `--version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the description shown in help
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Override the persisted parameter store location
    pub fn with_store_path(mut self, path: PathBuf) -> Self {
        self.store_path = Some(path);
        self
    }

    /// Replace the interactive prompter (tests, non-interactive embedding)
    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Set the default prompt retry ceiling
    pub fn with_prompt_retries(mut self, attempts: u32) -> Self {
        self.prompt_retries = attempts.max(1);
        self
    }

    /// Set the verbosity used by programmatic runs
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Declare the phase order and the default phase
    ///
    /// Must precede command registration so phase references validate.
    pub fn declare_phases(&mut self, order: &[&str], default: &str) -> Result<()> {
        self.phases = Some(PhasePlan::new(order.iter().copied(), default)?);
        Ok(())
    }

    /// Register a parameter; re-registering the same name overwrites
    pub fn param(&mut self, def: ParamDef) {
        self.params.define(def);
    }

    /// Pre-set a parameter value programmatically
    pub fn set_param(&mut self, name: &str, value: impl Into<crate::params::ParamValue>) {
        self.params.set(name, value);
    }

    /// Register a command; re-registering the same name overwrites
    pub fn command(&mut self, cmd: Command) -> Result<()> {
        self.commands.register(cmd, self.phases.as_ref())?;
        Ok(())
    }

    /// Attach a cycle to an already-registered command
    pub fn add_cycle(&mut self, command: &str, cycle: Cycle) -> Result<()> {
        self.commands.add_cycle(command, cycle, self.phases.as_ref())?;
        Ok(())
    }

    /// Declare a run-level; levels execute in declaration order
    pub fn run_level(&mut self, level: RunLevel) {
        self.run_levels.push(level);
    }

    /// Clear resolved parameter values, for test isolation between
    /// programmatic runs
    pub fn reset(&mut self) {
        self.params.reset();
    }

    /// Registered commands, in registration order
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The declared phase order
    pub fn all_phases(&self) -> Vec<String> {
        self.phases
            .as_ref()
            .map(|p| p.order().to_vec())
            .unwrap_or_default()
    }

    /// Run from the process arguments
    pub fn run(mut self) -> Result<RunOutcome> {
        dotenvy::dotenv().ok();
        let args: Vec<OsString> = std::env::args_os().collect();
        self.run_from(args)
    }

    /// Run from an explicit argument list (the programmatic CLI surface)
    pub fn run_from<I, T>(&mut self, args: I) -> Result<RunOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut cli = self.build_cli();
        let matches = match cli.clone().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => {
                use clap::error::ErrorKind;
                return match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        let _ = err.print();
                        Ok(RunOutcome::default())
                    }
                    _ => Err(CadreError::Cli(err.to_string())),
                };
            }
        };

        if let Some(shell) = matches.get_one::<Shell>("completions") {
            clap_complete::generate(*shell, &mut cli, self.name.clone(), &mut io::stdout());
            return Ok(RunOutcome::default());
        }

        if matches.get_flag("list-commands") {
            self.print_command_list();
            return Ok(RunOutcome::default());
        }

        let verbosity = get_verbosity(&matches);
        let raw = self.raw_param_values(&matches);
        let requested: Vec<String> = matches
            .get_many::<String>("commands")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        self.execute_queue(requested, raw, verbosity)
    }

    /// Run an ordered list of command names directly, skipping CLI parsing
    pub fn execute<S: AsRef<str>>(&mut self, requested: &[S]) -> Result<RunOutcome> {
        let requested: Vec<String> = requested.iter().map(|s| s.as_ref().to_string()).collect();
        self.execute_queue(requested, HashMap::new(), self.verbosity)
    }

    /// Generate shell completions for the CLI surface
    pub fn completions(&self, shell: Shell, out: &mut dyn io::Write) {
        let mut cli = self.build_cli();
        clap_complete::generate(shell, &mut cli, self.name.clone(), out);
    }

    fn execute_queue(
        &mut self,
        requested: Vec<String>,
        raw: HashMap<String, String>,
        verbosity: Verbosity,
    ) -> Result<RunOutcome> {
        if let Some(plan) = &self.phases {
            self.commands.validate_phases(plan)?;
        }

        let store = match &self.store_path {
            Some(path) => Some(ParamStore::new(path.clone())),
            None if self.params.any_persist() => ParamStore::for_app(&self.name),
            None => None,
        };
        let stored = match &store {
            Some(store) => store.load()?,
            None => HashMap::new(),
        };

        let prompter = self
            .prompter
            .take()
            .unwrap_or_else(|| Box::new(ConsolePrompter));
        let mut ctx = RunContext::new(self.params.clone())
            .with_prompter(prompter)
            .with_store(store)
            .with_verbosity(verbosity)
            .with_prompt_retries(self.prompt_retries);

        let implicit = self.run_levels.is_empty();
        let levels: Vec<RunLevel> = if implicit {
            vec![RunLevel::new("main").default_level()]
        } else {
            self.run_levels.clone()
        };
        let default_level = levels.iter().position(|l| l.is_default()).unwrap_or(0);

        let mut command_level: HashMap<String, usize> = HashMap::new();
        for (idx, level) in levels.iter().enumerate() {
            for name in level.scoped_commands() {
                command_level.insert(name.clone(), idx);
            }
        }

        let claimed: HashSet<String> = levels
            .iter()
            .flat_map(|l| l.scoped_params().iter().cloned())
            .collect();
        let all_params: Vec<String> = self.params.defs().map(|d| d.name.clone()).collect();

        let mut executor = Executor::new(&self.commands);

        for (idx, level) in levels.iter().enumerate() {
            executor.set_handler(level.handler());
            ctx.print_debug(&format!("Run-level '{}'", level.name()));

            for (key, value) in level.overlay_pairs() {
                let interpolated = interpolate(value, &ctx.params.string_map())
                    .unwrap_or_else(|_| value.clone());
                ctx.params.set_raw(key, &interpolated)?;
            }

            let scope: Option<HashSet<String>> = if implicit {
                None
            } else {
                let mut set: HashSet<String> =
                    level.scoped_params().iter().cloned().collect();
                if idx == default_level {
                    set.extend(
                        all_params
                            .iter()
                            .filter(|p| !claimed.contains(*p))
                            .cloned(),
                    );
                }
                Some(set)
            };
            ctx.params.resolve_pass(&raw, scope.as_ref(), &stored)?;

            let mut queue: Vec<String> = requested
                .iter()
                .filter(|name| {
                    command_level.get(*name).copied().unwrap_or(default_level) == idx
                })
                .cloned()
                .collect();

            // commands whose trigger parameter resolved during parsing
            for cmd in self.commands.iter() {
                if command_level
                    .get(&cmd.name)
                    .copied()
                    .unwrap_or(default_level)
                    != idx
                {
                    continue;
                }
                let Some(trigger) = &cmd.trigger_param else {
                    continue;
                };
                if ctx.params.is_set(trigger)
                    && !queue.iter().any(|q| q == &cmd.name)
                    && !executor.is_completed(&cmd.name)
                {
                    queue.push(cmd.name.clone());
                }
            }

            if queue.is_empty() {
                continue;
            }

            let sequence = resolve(&self.commands, self.phases.as_ref(), &queue)?;
            executor.execute(sequence, &mut ctx)?;
        }

        ctx.flush_persist()?;
        let completed = executor.completed_order().to_vec();
        Ok(RunOutcome {
            completed,
            params: ctx.into_params(),
        })
    }

    /// Build the clap command for the CLI surface
    fn build_cli(&self) -> clap::Command {
        let mut cli = clap::Command::new(self.name.clone())
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .help("Only print command output and errors")
                    .action(ArgAction::SetTrue)
                    .global(true),
            )
            .arg(
                Arg::new("silent")
                    .short('s')
                    .long("silent")
                    .help("Print no output")
                    .action(ArgAction::SetTrue)
                    .global(true),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Print verbose output")
                    .action(ArgAction::SetTrue)
                    .global(true),
            )
            .arg(
                Arg::new("list-commands")
                    .long("list-commands")
                    .help("List registered commands and exit")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("completions")
                    .long("completions")
                    .value_name("SHELL")
                    .help("Generate shell completions and exit")
                    .value_parser(clap::value_parser!(Shell)),
            )
            .arg(
                Arg::new("commands")
                    .value_name("COMMANDS")
                    .help("Commands to run, in order")
                    .num_args(0..),
            );

        if let Some(version) = &self.version {
            cli = cli.version(version.clone());
        }
        if let Some(about) = &self.about {
            cli = cli.about(about.clone());
        }

        for def in self.params.defs() {
            if def.hidden {
                continue;
            }

            let mut arg = Arg::new(def.name.clone())
                .long(def.name.clone())
                .help(def.about.clone().unwrap_or_default());

            for alias in &def.aliases {
                arg = arg.visible_alias(alias.clone());
            }

            // defaults are applied by the resolution chain, not by clap
            arg = match def.kind {
                ValueKind::Bool => arg.action(ArgAction::SetTrue),
                _ => arg
                    .value_name(def.name.to_uppercase())
                    .action(ArgAction::Set),
            };

            cli = cli.arg(arg);
        }

        cli
    }

    /// Collect parameter values the user actually passed on the command line
    fn raw_param_values(&self, matches: &ArgMatches) -> HashMap<String, String> {
        let mut raw = HashMap::new();
        for def in self.params.defs() {
            if def.hidden {
                continue;
            }
            if matches.value_source(&def.name) != Some(ValueSource::CommandLine) {
                continue;
            }
            match def.kind {
                ValueKind::Bool => {
                    if matches.get_flag(&def.name) {
                        raw.insert(def.name.clone(), "true".to_string());
                    }
                }
                _ => {
                    if let Some(value) = matches.get_one::<String>(&def.name) {
                        raw.insert(def.name.clone(), value.clone());
                    }
                }
            }
        }
        raw
    }

    fn print_command_list(&self) {
        for cmd in self.commands.iter() {
            if cmd.exclude_from_help {
                continue;
            }
            let about = cmd.about.as_deref().unwrap_or("");
            let phase = cmd.phase.as_deref().unwrap_or("-");
            let tag = if cmd.framework { " (framework)" } else { "" };
            println!("{:<20} {:<12} {}{}", cmd.name, phase, about, tag);
        }
    }
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}
