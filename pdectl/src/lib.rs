//! Maintenance tooling for the PDEBench dashboard project tree.
//!
//! `pdectl` rewrites relocated Python imports, scaffolds package markers,
//! verifies the project layout, and bootstraps a virtual environment before
//! starting the Streamlit dashboard. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (rewrite rules, diffs, module
//!   resolution, command rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, file rewrites, directory
//!   walks, scaffolding, venv provisioning, process execution).
//!
//! Orchestration modules ([`fix`], [`launch`], [`verify`]) coordinate core
//! logic with I/O to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod fix;
pub mod io;
pub mod launch;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod verify;
