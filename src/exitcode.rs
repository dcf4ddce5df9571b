//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Any failure: usage, connection or command
pub const FAILURE: i32 = 1;
