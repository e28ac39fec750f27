//! I/O helpers for casegen commands.

pub mod bundle;
pub mod config;
pub mod output;
pub mod prompt;
pub mod spec_file;
pub mod transcript;
