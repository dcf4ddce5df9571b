//! Application layer: use cases and presentation
//!
//! This layer orchestrates record operations through the `RecordStore` boundary.

pub mod error;
pub mod format;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
