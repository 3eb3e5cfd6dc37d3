//! Structure verification for `pdectl verify`.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::modules::module_candidates;
use crate::core::rules::RuleSet;
use crate::core::types::Finding;
use crate::io::config::Config;
use crate::io::walk::python_files;

/// High-level verification outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub findings: Vec<Finding>,
}

impl VerifyOutcome {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check required directories, expected modules, and leftover legacy imports.
///
/// Every problem is collected; nothing short-circuits.
pub fn verify_project(root: &Path, cfg: &Config) -> VerifyOutcome {
    let mut findings = Vec::new();

    for dir in &cfg.verify.directories {
        let abs = root.join(dir);
        if !abs.exists() {
            findings.push(Finding::MissingDirectory { path: dir.clone() });
        } else if !abs.is_dir() {
            findings.push(Finding::NotADirectory { path: dir.clone() });
        }
    }

    for module in &cfg.verify.modules {
        let found = module_candidates(module)
            .is_some_and(|candidates| candidates.iter().any(|rel| root.join(rel).is_file()));
        if !found {
            findings.push(Finding::MissingModule {
                module: module.clone(),
            });
        }
    }

    let rules = RuleSet::package_migration();
    for rel in python_files(root, &cfg.migrate.directories) {
        let text = match fs::read_to_string(root.join(&rel)) {
            Ok(text) => text,
            Err(err) => {
                findings.push(Finding::Unreadable {
                    path: rel,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let lines: Vec<&str> = text.lines().collect();
        for line in rules.stale_lines(&text) {
            findings.push(Finding::StaleImport {
                path: rel.clone(),
                line,
                text: lines[line - 1].to_string(),
            });
        }
    }

    debug!(findings = findings.len(), "verification finished");
    VerifyOutcome { findings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::VerifyConfig;
    use crate::test_support::TestProject;
    use std::path::PathBuf;

    fn config(modules: &[&str]) -> Config {
        Config {
            verify: VerifyConfig {
                modules: modules.iter().map(|m| m.to_string()).collect(),
                ..VerifyConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn empty_project_reports_missing_directories_and_modules() {
        let project = TestProject::new().expect("project");
        let outcome = verify_project(project.root(), &config(&["core.solvers.analytical"]));
        assert_eq!(
            outcome.findings,
            vec![
                Finding::MissingDirectory {
                    path: PathBuf::from("interfaces")
                },
                Finding::MissingDirectory {
                    path: PathBuf::from("core")
                },
                Finding::MissingModule {
                    module: "core.solvers.analytical".to_string()
                },
            ]
        );
    }

    #[test]
    fn modules_resolve_to_files_or_packages() {
        let project = TestProject::new().expect("project");
        project.mkdir("interfaces").expect("mkdir");
        project
            .write("core/solvers/analytical.py", "class AnalyticalSolver: ...\n")
            .expect("write");
        project
            .write("core/equations/__init__.py", "")
            .expect("write");

        let outcome = verify_project(
            project.root(),
            &config(&["core.solvers.analytical", "core.equations"]),
        );
        assert!(outcome.is_clean(), "{:?}", outcome.findings);
    }

    #[test]
    fn stale_imports_are_reported_with_line_numbers() {
        let project = TestProject::new()
            .expect("project")
            .with_legacy_dashboard()
            .expect("layout");

        let outcome = verify_project(project.root(), &config(&[]));
        assert!(outcome.findings.contains(&Finding::StaleImport {
            path: PathBuf::from("core/solvers/comparison.py"),
            line: 2,
            text: "from core.utils import norms".to_string(),
        }));
        let stale = outcome
            .findings
            .iter()
            .filter(|f| matches!(f, Finding::StaleImport { .. }))
            .count();
        assert_eq!(stale, 6);
    }
}
