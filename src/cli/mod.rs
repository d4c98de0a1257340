//! CLI interface
//!
//! This module builds the application's command-line surface from the
//! registered parameters and drives runs from parsed arguments.

pub mod app;

// Re-export main types
pub use app::*;
