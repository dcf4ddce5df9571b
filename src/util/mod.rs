//! Shared helpers

/// Test fixtures; built for unit tests and with the `testing` feature.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
