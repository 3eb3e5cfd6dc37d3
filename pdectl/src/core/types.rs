//! Shared report types for rewrite, scaffold, and verify results.
//!
//! Reports are plain data: orchestration builds them, `main` renders them as
//! text or JSON.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::diff::LineChange;

/// What happened to a single file during a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one import was rewritten (or would be, in a dry run).
    Rewritten { replacements: usize },
    /// The file exists but nothing matched.
    Unchanged,
    /// The path does not exist as a regular file; skipped without mutation.
    Missing,
    /// Reading or writing failed; the file is left as it was.
    Failed { reason: String },
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Rewritten { .. } => "rewritten",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Missing => "missing",
            FileStatus::Failed { .. } => "failed",
        }
    }
}

/// Per-file result, with the changed lines when diffs were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Path relative to the project root.
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<LineChange>,
}

/// Ordered outcomes of one rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixReport {
    pub rule_set: String,
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
}

impl FixReport {
    fn count(&self, label: &str) -> usize {
        self.files
            .iter()
            .filter(|file| file.status.label() == label)
            .count()
    }

    pub fn rewritten(&self) -> usize {
        self.count("rewritten")
    }

    pub fn unchanged(&self) -> usize {
        self.count("unchanged")
    }

    pub fn missing(&self) -> usize {
        self.count("missing")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn replacements(&self) -> usize {
        self.files
            .iter()
            .map(|file| match file.status {
                FileStatus::Rewritten { replacements } => replacements,
                _ => 0,
            })
            .sum()
    }
}

/// Package markers created (or planned) by a scaffold pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaffoldReport {
    pub dry_run: bool,
    pub created: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
}

/// A single structure verification problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    MissingDirectory { path: PathBuf },
    NotADirectory { path: PathBuf },
    MissingModule { module: String },
    StaleImport { path: PathBuf, line: usize, text: String },
    Unreadable { path: PathBuf, reason: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingDirectory { path } => {
                write!(f, "missing directory {}", path.display())
            }
            Finding::NotADirectory { path } => write!(f, "expected directory {}", path.display()),
            Finding::MissingModule { module } => write!(f, "missing module {module}"),
            Finding::StaleImport { path, line, text } => {
                write!(f, "stale import {}:{}: {}", path.display(), line, text.trim())
            }
            Finding::Unreadable { path, reason } => {
                write!(f, "unreadable {}: {}", path.display(), reason)
            }
        }
    }
}
