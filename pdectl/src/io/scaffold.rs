//! Package marker (`__init__.py`) scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::core::types::ScaffoldReport;

pub const PACKAGE_MARKER: &str = "__init__.py";

/// Ensure every directory in `packages` exists and holds an `__init__.py`.
///
/// Existing markers are never overwritten. With `dry_run`, nothing is created
/// and the report lists what would be.
pub fn ensure_package_markers(
    root: &Path,
    packages: &[PathBuf],
    contents: &str,
    dry_run: bool,
) -> Result<ScaffoldReport> {
    let mut report = ScaffoldReport {
        dry_run,
        ..ScaffoldReport::default()
    };
    for package in packages {
        let rel = package.join(PACKAGE_MARKER);
        let dir = root.join(package);
        let marker = root.join(&rel);

        if dir.exists() && !dir.is_dir() {
            return Err(anyhow!("expected directory {}", dir.display()));
        }
        if marker.exists() {
            if !marker.is_file() {
                return Err(anyhow!("expected file {}", marker.display()));
            }
            debug!(path = %rel.display(), "package marker present");
            report.existing.push(rel);
            continue;
        }

        if !dry_run {
            fs::create_dir_all(&dir)
                .with_context(|| format!("create directory {}", dir.display()))?;
            fs::write(&marker, contents)
                .with_context(|| format!("write file {}", marker.display()))?;
            info!(path = %rel.display(), "created package marker");
        }
        report.created.push(rel);
    }
    Ok(report)
}
