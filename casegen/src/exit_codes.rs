//! Stable exit codes for casegen CLI commands.

/// Command succeeded and its output was written.
pub const OK: i32 = 0;
/// Generation, aggregation or I/O failed; nothing was written.
pub const FAILED: i32 = 1;
/// Configuration is invalid or a required input (e.g. the API key) is missing.
pub const CONFIG: i32 = 2;
