//! In-place application of rewrite rules to files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::diff::line_changes;
use crate::core::rules::RuleSet;
use crate::core::types::{FileOutcome, FileStatus, FixReport};

/// How a rewrite pass treats the files it visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Compute outcomes without writing anything.
    pub dry_run: bool,
    /// Record changed lines for each rewritten file.
    pub collect_changes: bool,
}

/// Rewrite `rel` (relative to `root`) in place.
///
/// Never fails: missing files and I/O errors become [`FileStatus::Missing`] and
/// [`FileStatus::Failed`] so a pass over many files keeps going.
pub fn rewrite_file(root: &Path, rel: &Path, rules: &RuleSet, options: RewriteOptions) -> FileOutcome {
    let path = root.join(rel);
    let outcome = |status, changes| FileOutcome {
        path: rel.to_path_buf(),
        status,
        changes,
    };

    if !path.is_file() {
        debug!(path = %rel.display(), "skipping missing file");
        return outcome(FileStatus::Missing, Vec::new());
    }

    let original = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %rel.display(), err = %err, "failed to read file");
            return outcome(
                FileStatus::Failed {
                    reason: format!("read: {err}"),
                },
                Vec::new(),
            );
        }
    };

    let rewrite = rules.apply(&original);
    if !rewrite.changed() {
        debug!(path = %rel.display(), "no matching imports");
        return outcome(FileStatus::Unchanged, Vec::new());
    }

    let changes = if options.collect_changes {
        line_changes(&original, &rewrite.text)
    } else {
        Vec::new()
    };

    if !options.dry_run
        && let Err(err) = write_in_place(&path, &rewrite.text)
    {
        let reason = format!("{err:#}");
        warn!(path = %rel.display(), err = %reason, "failed to write file");
        return outcome(FileStatus::Failed { reason }, Vec::new());
    }

    debug!(
        path = %rel.display(),
        replacements = rewrite.replacements,
        dry_run = options.dry_run,
        "rewrote imports"
    );
    outcome(
        FileStatus::Rewritten {
            replacements: rewrite.replacements,
        },
        changes,
    )
}

/// Rewrite each path in order and collect the outcomes.
pub fn rewrite_files(
    root: &Path,
    files: &[PathBuf],
    rules: &RuleSet,
    options: RewriteOptions,
) -> FixReport {
    let files = files
        .iter()
        .map(|rel| rewrite_file(root, rel, rules, options))
        .collect();
    FixReport {
        rule_set: rules.name().to_string(),
        dry_run: options.dry_run,
        files,
    }
}

/// Replace `path` atomically (temp file + rename), keeping its permissions.
fn write_in_place(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?;
    let permissions = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .permissions();

    let tmp_path = parent.join(format!(".{}.pdectl.tmp", file_name.to_string_lossy()));
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    let replaced = fs::set_permissions(&tmp_path, permissions)
        .with_context(|| format!("set permissions {}", tmp_path.display()))
        .and_then(|()| {
            fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))
        });
    if replaced.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    replaced
}
