//! Command dispatch
//!
//! A fixed table maps command names to handlers. The table is built once at
//! startup and the record store is injected through `CommandContext`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use tracing::debug;

use crate::cli::handlers;
use crate::cli::{CliError, CliResult};
use crate::infrastructure::RecordStore;

/// Everything a handler may touch while running.
pub struct CommandContext<'a> {
    /// Program name used in usage text
    pub program: &'a str,
    /// Record store (lazily connected)
    pub store: &'a dyn RecordStore,
    /// Destination for normal output
    pub out: &'a mut dyn Write,
}

/// One subcommand.
pub trait Handler: Sync {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// Positional arguments as shown in the usage text.
    fn synopsis(&self) -> &'static str;

    /// Run the command with its positional arguments (command name excluded).
    fn run(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CliResult<()>;
}

/// Maps command names to handlers.
pub struct Dispatcher {
    handlers: BTreeMap<&'static str, &'static dyn Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Dispatcher with every registrar command.
    pub fn new() -> Self {
        Self::with_handlers(handlers::ALL)
    }

    /// Dispatcher with a custom handler set.
    pub fn with_handlers(handlers: &[&'static dyn Handler]) -> Self {
        let handlers = handlers
            .iter()
            .map(|handler| (handler.name(), *handler))
            .collect();
        Self { handlers }
    }

    /// Registered command names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Look up the command named by `argv[0]` and run it with the remaining arguments.
    pub fn dispatch(&self, argv: &[String], ctx: &mut CommandContext<'_>) -> CliResult<()> {
        let (name, args) = argv.split_first().ok_or(CliError::MissingCommand)?;
        let handler = self
            .handlers
            .get(name.as_str())
            .ok_or_else(|| CliError::UnknownCommand(name.clone()))?;
        debug!("dispatch: command={} args={:?}", name, args);
        handler.run(ctx, args)
    }
}

/// Usage text listing every command and its positional arguments.
pub fn usage(program: &str) -> String {
    let mut text = format!("usage: {program} command [args...]\n\nCommands:\n");
    for handler in handlers::ALL {
        let line = format!("  {:<13} {}", handler.name(), handler.synopsis());
        let _ = writeln!(text, "{}", line.trim_end());
    }
    text
}
