//! Deterministic, pure logic shared by the generation pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! text and return deterministic outputs suitable for tests.

pub mod aggregate;
pub mod fences;
pub mod recognizer;
pub mod types;
