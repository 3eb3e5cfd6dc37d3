//! Deterministic, pure logic shared by the pdectl commands.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! text and paths and return deterministic outputs suitable for tests.

pub mod command;
pub mod diff;
pub mod modules;
pub mod rules;
pub mod types;
