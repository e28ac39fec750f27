//! Test generation pipeline backed by a chat-completion API.
//!
//! The crate turns a set of source files plus a human-edited list of test
//! cases into a single generated test file. The architecture keeps the same
//! split throughout:
//!
//! - **[`core`]**: Pure text logic (spec types, line recognition, fragment
//!   aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting helpers (source bundles, spec files, config,
//!   prompt rendering, transcripts, artifact output).
//! - **[`backend`]**: The chat-completion seam and its HTTP implementation.
//!
//! [`client`] and [`dispatch`] drive the backend; [`pipeline`] wires them into
//! the `cases` and `code` commands.

pub mod backend;
pub mod client;
pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
