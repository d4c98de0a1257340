//! Error types for Cadre

use std::io;
use thiserror::Error;

/// Result type alias for Cadre operations
pub type Result<T> = std::result::Result<T, CadreError>;

/// Main error type for Cadre
#[derive(Error, Debug)]
pub enum CadreError {
    /// Command registration errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Queue resolution errors
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Command execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Parameter errors
    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    /// CLI parsing errors
    #[error("CLI error: {0}")]
    Cli(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON errors from the parameter store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Command registration and lookup errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Command '{0}' is not registered")]
    UnknownCommand(String),

    #[error("Phase '{phase}' referenced by '{referenced_by}' is not in the declared phase order")]
    UnknownPhase {
        phase: String,
        referenced_by: String,
    },

    #[error("Phase '{0}' is declared more than once")]
    DuplicatePhase(String),
}

/// Queue resolution errors
///
/// All resolution errors are fatal: they fail the run before any command executes.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Circular requirement detected: {0}")]
    CircularRequirement(String),

    #[error("Ordering conflict: '{first}' must precede '{second}' but the resolved order places it later")]
    OrderingConflict { first: String, second: String },
}

/// Parameter definition and value errors
#[derive(Error, Debug)]
pub enum ParamError {
    #[error("Parameter '{0}' has no resolved value")]
    MissingParam(String),

    #[error("Parameter '{0}' is not defined")]
    UnknownParam(String),

    #[error("Invalid value for parameter '{name}': {error}")]
    InvalidValue { name: String, error: String },
}

/// Command execution errors
///
/// These are per-command failures: a run-level error handler may recover from
/// them, otherwise they abort the remaining queue.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{command}' is missing required parameter(s): {missing}")]
    MissingRequiredParam { command: String, missing: String },

    #[error("Prompt for parameter '{param}' failed after {attempts} attempt(s)")]
    RetriesExhausted { param: String, attempts: u32 },

    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    #[error("Command '{0}' is already running (recursive invocation)")]
    RecursiveCommand(String),

    #[error("Command '{command}' failed: {message}")]
    ActionFailed { command: String, message: String },

    #[error("Persistence error: {0}")]
    Persist(String),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Specialized result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Specialized result type for resolution operations
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Specialized result type for parameter operations
pub type ParamResult<T> = std::result::Result<T, ParamError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Helper function to determine if an error is a per-command parameter failure
/// (which an error handler will typically recover, unlike an action error)
pub fn is_param_failure(err: &ExecutionError) -> bool {
    matches!(
        err,
        ExecutionError::MissingRequiredParam { .. } | ExecutionError::Param(_)
    )
}
