//! Mapping dotted Python module names onto project-relative file paths.

use std::path::PathBuf;

/// True if `name` is a dotted path of identifier segments (`core.solvers.analytical`).
pub fn is_valid_module(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// Files that would satisfy an import of `module`: `a/b/c.py` then `a/b/c/__init__.py`.
///
/// Returns `None` for names that are not valid dotted module paths.
pub fn module_candidates(module: &str) -> Option<[PathBuf; 2]> {
    if !is_valid_module(module) {
        return None;
    }
    let base: PathBuf = module.split('.').collect();
    let file = base.with_extension("py");
    let package = base.join("__init__.py");
    Some([file, package])
}
