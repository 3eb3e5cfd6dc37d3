//! Orchestration for `pdectl fix-imports` and `pdectl migrate`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::core::rules::RuleSet;
use crate::core::types::{FixReport, ScaffoldReport};
use crate::io::config::Config;
use crate::io::rewrite::{RewriteOptions, rewrite_files};
use crate::io::scaffold::ensure_package_markers;
use crate::io::walk::python_files;

/// Relocate `core.utils` / `backend.utils` imports in the fixed file list.
///
/// Per-file problems are reported in the returned [`FixReport`], never as an
/// error: missing files are skipped and the pass always completes.
pub fn fix_imports(root: &Path, cfg: &Config, options: RewriteOptions) -> FixReport {
    info!(files = cfg.fix.files.len(), dry_run = options.dry_run, "fixing imports");
    rewrite_files(root, &cfg.fix.files, RuleSet::utils_relocation(), options)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrateOutcome {
    pub report: FixReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaffold: Option<ScaffoldReport>,
}

/// Apply the package migration table to every `*.py` under the migrate
/// directories, then ensure package markers unless `scaffold` is false.
pub fn migrate(
    root: &Path,
    cfg: &Config,
    options: RewriteOptions,
    scaffold: bool,
) -> Result<MigrateOutcome> {
    let files = python_files(root, &cfg.migrate.directories);
    info!(files = files.len(), dry_run = options.dry_run, "migrating imports");
    let report = rewrite_files(root, &files, RuleSet::package_migration(), options);

    let scaffold = if scaffold {
        Some(
            ensure_package_markers(
                root,
                &cfg.scaffold.packages,
                &cfg.scaffold.init_contents,
                options.dry_run,
            )
            .context("scaffold package markers")?,
        )
    } else {
        None
    };

    Ok(MigrateOutcome { report, scaffold })
}
