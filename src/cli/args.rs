//! CLI argument definitions using clap
//!
//! clap handles the global options only. The command name and its positional
//! arguments are collected verbatim and resolved by the dispatcher.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueHint};

/// Course, student and enrolment record keeping
#[derive(Parser, Debug)]
#[command(name = "registrar")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(override_usage = "registrar [OPTIONS] <COMMAND> [ARGS]...\n       registrar help")]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file (TOML), layered over the global config
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides config)
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub database: Option<PathBuf>,

    /// Disable colored diagnostics
    #[arg(long)]
    pub no_color: bool,

    /// Command name followed by its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Name the program was invoked as (basename of argv[0]).
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "registrar".to_string())
}
