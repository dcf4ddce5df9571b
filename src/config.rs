//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/registrar/registrar.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `REGISTRAR_*` prefix, `__` between sections
//!
//! The `--database` flag is applied by the caller on top of the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file (must already exist)
    pub path: PathBuf,
    /// How long to wait for a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// Upper bound for a single operation, in milliseconds (0 disables)
    pub statement_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("registrar.db"),
            busy_timeout_ms: 5_000,
            statement_timeout_ms: 10_000,
        }
    }
}

impl DatabaseSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_ms > 0).then(|| Duration::from_millis(self.statement_timeout_ms))
    }
}

/// Unified configuration for registrar.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Database settings
    pub database: DatabaseSettings,
}

/// Get the XDG config directory for registrar.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "registrar").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("registrar.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path; unknown variables leave it unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given on the command line; it must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), explicit)
    }

    /// Load settings from an explicit global config location (for testing).
    pub fn load_from(global: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Self::default();

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default(
                "database.path",
                defaults.database.path.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default(
                "database.busy_timeout_ms",
                i64::try_from(defaults.database.busy_timeout_ms).unwrap_or(i64::MAX),
            )
            .map_err(config_err)?
            .set_default(
                "database.statement_timeout_ms",
                i64::try_from(defaults.database.statement_timeout_ms).unwrap_or(i64::MAX),
            )
            .map_err(config_err)?;

        // 2. Global config (optional)
        if let Some(global_path) = global {
            debug!("global config: {}", global_path.display());
            builder = builder.add_source(
                File::from(global_path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // 3. Explicit config (required)
        if let Some(path) = explicit {
            debug!("explicit config: {}", path.display());
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        // 4. Environment overrides, e.g. REGISTRAR_DATABASE__PATH
        builder = builder.add_source(
            Environment::with_prefix("REGISTRAR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();

        Ok(settings)
    }

    /// Override the database path (e.g. from `--database`).
    pub fn with_database_path(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.database.path = expand_path(path);
        }
        self
    }

    fn expand_paths(&mut self) {
        self.database.path = expand_path(&self.database.path);
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
