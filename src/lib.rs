//! Cadre - a declarative command-line application framework
//!
//! Cadre lets application authors register parameters (typed CLI flags with
//! defaults, aliases, persistence, and interactive prompting) and commands
//! (named actions with ordering constraints, phases, and repeat-loop cycles),
//! then drives argument parsing, prompting, sequencing, and execution.

// Public modules
pub mod cli;
pub mod engine;
pub mod error;
pub mod params;
pub mod registry;
pub mod ui;

// Re-export commonly used types
pub use cli::{App, RunOutcome};
pub use engine::{Recovery, RunContext, RunLevel, Verbosity};
pub use error::{CadreError, ExecutionError, Result};
pub use params::{ParamDef, ParamValue, PromptSpec, ValueKind};
pub use registry::{Command, CommandRef, Cycle};

/// Current version of Cadre
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
