//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print the pointer to the help command to stderr
pub fn help_hint(program: &str) {
    eprintln!();
    eprintln!("run '{}' for help", format!("{program} help").cyan());
}

/// Report a failed invocation: the error, then the help hint
pub fn failure(msg: &(impl std::fmt::Display + ?Sized), program: &str) {
    error(msg);
    help_hint(program);
}
