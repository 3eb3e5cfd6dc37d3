//! I/O helpers for pdectl commands.

pub mod config;
pub mod process;
pub mod rewrite;
pub mod scaffold;
pub mod venv;
pub mod walk;
