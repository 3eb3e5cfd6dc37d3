//! Line-level diffs between a file and its rewritten text.
//!
//! Rewrites substitute within lines and never insert or remove newlines, so
//! the two texts always have the same number of lines and a positional
//! comparison is exact.

use serde::Serialize;

/// A single line whose text differs after rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    /// 1-based line number.
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Compare `before` and `after` line by line.
pub fn line_changes(before: &str, after: &str) -> Vec<LineChange> {
    debug_assert_eq!(before.lines().count(), after.lines().count());
    before
        .lines()
        .zip(after.lines())
        .enumerate()
        .filter(|(_, (old, new))| old != new)
        .map(|(idx, (old, new))| LineChange {
            line: idx + 1,
            before: old.to_string(),
            after: new.to_string(),
        })
        .collect()
}

/// Render changes for `path` in a compact unified-diff style.
pub fn render_diff(path: &str, changes: &[LineChange]) -> String {
    if changes.is_empty() {
        return String::new();
    }
    let mut out = format!("--- a/{path}\n+++ b/{path}\n");
    for change in changes {
        out.push_str(&format!("@@ -{0} +{0} @@\n", change.line));
        out.push_str(&format!("-{}\n", change.before));
        out.push_str(&format!("+{}\n", change.after));
    }
    out
}
