//! registrar: course, student and enrolment records from the command line
//!
//! Each invocation runs exactly one command against a SQLite database:
//! arguments are resolved by [`cli::Dispatcher`], executed through
//! [`application::services::RegistrarService`], and stored via the
//! [`infrastructure::RecordStore`] boundary.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
