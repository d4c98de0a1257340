//! Terminal output helpers
//!
//! Status lines go to stderr so command output on stdout stays clean.

use colored::Colorize;

pub fn info(message: &str) {
    eprintln!("{} {}", "[INFO]".cyan().bold(), message);
}

pub fn run(message: &str) {
    eprintln!("{} {}", "[RUN]".green().bold(), message);
}

pub fn done(message: &str) {
    eprintln!("{} {}", "[DONE]".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

pub fn debug(message: &str) {
    eprintln!("{} {}", "[DEBUG]".dimmed(), message);
}
