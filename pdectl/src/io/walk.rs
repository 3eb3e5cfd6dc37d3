//! Discovery of Python sources under the migrate directories.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collect `*.py` files below each directory, relative to `root`.
///
/// Directories are visited in the given order and entries in file-name order,
/// so the result is deterministic. Missing directories are skipped; unreadable
/// entries are logged and skipped.
pub fn python_files(root: &Path, directories: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in directories {
        let abs = root.join(dir);
        if !abs.is_dir() {
            debug!(dir = %dir.display(), "skipping missing directory");
            continue;
        }
        for entry in WalkDir::new(&abs).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), err = %err, "failed to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().is_none_or(|ext| ext != "py") {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf());
            if !files.contains(&rel) {
                files.push(rel);
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn collects_sorted_python_files_only() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("core/solvers")).expect("mkdir");
        fs::write(root.join("core/solvers/b.py"), "").expect("write");
        fs::write(root.join("core/solvers/a.py"), "").expect("write");
        fs::write(root.join("core/readme.md"), "").expect("write");
        fs::write(root.join("core/__init__.py"), "").expect("write");

        let files = python_files(root, &[PathBuf::from("core"), PathBuf::from("missing")]);
        assert_eq!(
            files,
            vec![
                PathBuf::from("core/__init__.py"),
                PathBuf::from("core/solvers/a.py"),
                PathBuf::from("core/solvers/b.py"),
            ]
        );
    }

    #[test]
    fn overlapping_directories_do_not_duplicate() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("interfaces/streamlit")).expect("mkdir");
        fs::write(root.join("interfaces/streamlit/app.py"), "").expect("write");

        let files = python_files(
            root,
            &[
                PathBuf::from("interfaces"),
                PathBuf::from("interfaces/streamlit"),
            ],
        );
        assert_eq!(files, vec![PathBuf::from("interfaces/streamlit/app.py")]);
    }
}
