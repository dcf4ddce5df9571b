use std::env;
use std::path::Path;
use std::sync::Once;

use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::DatabaseSettings;
use crate::infrastructure::SqliteStore;

/// Reference schema shipped in `sql/schema.sql`.
pub const SCHEMA: &str = include_str!("../../sql/schema.sql");

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = [""];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| !name.is_empty() && metadata.target().starts_with(name))
    });

    // Set up the subscriber with environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    // Build and set the subscriber
    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Create a database file with the reference schema.
pub fn create_database(path: &Path) -> rusqlite::Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    conn.close().map_err(|(_, e)| e)
}

/// In-memory store with the reference schema applied.
pub fn memory_store() -> SqliteStore {
    let conn = Connection::open_in_memory().expect("open in-memory database");
    conn.execute_batch(SCHEMA).expect("apply schema");
    SqliteStore::from_connection(conn, DatabaseSettings::default()).expect("configure store")
}

// test
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::RecordStore;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_memory_store_when_listing_then_schema_is_present() {
        let store = memory_store();
        assert!(store.list_students().unwrap().is_empty());
        assert!(store.list_courses().unwrap().is_empty());
    }
}
