//! Infrastructure layer: data access boundary
//!
//! This layer implements the record store trait on top of SQLite and is the
//! only place that knows about raw database errors.

pub mod database;
pub mod error;
pub mod traits;

pub use database::{Record, SqliteStore};
pub use error::{InfraError, InfraResult};
pub use traits::RecordStore;
