use std::io::{self, Write};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use registrar::cli::args::program_name;
use registrar::cli::{output, Cli, CommandContext, Dispatcher};
use registrar::config::Settings;
use registrar::exitcode;
use registrar::infrastructure::SqliteStore;

fn main() {
    let program = program_name();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                // clap's own exit status would be 2
                let _ = e.print();
                output::help_hint(&program);
                process::exit(exitcode::FAILURE);
            }
        },
    };

    if cli.no_color {
        colored::control::set_override(false);
    }

    setup_logging(cli.debug);

    process::exit(run(&cli, &program));
}

/// Run one command, close the database. Returns the exit code.
///
/// Settings errors surface only when the command reaches the database.
fn run(cli: &Cli, program: &str) -> i32 {
    let settings = Settings::load(cli.config.as_deref())
        .map(|settings| settings.with_database_path(cli.database.as_deref()).database)
        .map_err(|e| e.to_string());
    match &settings {
        Ok(database) => debug!("database: {}", database.path.display()),
        Err(e) => debug!("settings not loaded: {e}"),
    }

    let store = SqliteStore::with_settings(settings);
    let dispatcher = Dispatcher::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = {
        let mut ctx = CommandContext {
            program,
            store: &store,
            out: &mut out,
        };
        dispatcher.dispatch(&cli.command, &mut ctx)
    };
    let flushed = out.flush();
    let closed = store.close();

    if let Err(e) = result {
        debug!("command failed (usage error: {})", e.is_usage());
        output::failure(&e, program);
        return e.exit_code();
    }
    if let Err(e) = flushed {
        output::error(&format!("cannot write output: {e}"));
        return exitcode::FAILURE;
    }
    if let Err(e) = closed {
        output::error(&e);
        return exitcode::FAILURE;
    }
    exitcode::OK
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // RUST_LOG wins when set, otherwise the -d count decides
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(filter.into()));

    // Create a subscriber with formatted output directed to stderr
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .init();

    // Log initial debug level
    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
