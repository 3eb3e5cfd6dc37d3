//! Stable exit codes for pdectl commands.
//!
//! `pdectl launch` exits with the dashboard's own code once it has started.

/// Command succeeded (`fix-imports` always ends here once its config loads).
pub const OK: i32 = 0;
/// Wrong working directory, invalid config, failed verification, or a failed
/// environment bootstrap.
pub const INVALID: i32 = 1;
