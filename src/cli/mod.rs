//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod output;

pub use args::Cli;
pub use dispatch::{usage, CommandContext, Dispatcher, Handler};
pub use error::{CliError, CliResult};
