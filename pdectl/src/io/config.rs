//! Project configuration stored in `pdectl.toml` at the project root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::modules::is_valid_module;

/// Default config file name, resolved against the project root.
pub const CONFIG_FILE: &str = "pdectl.toml";

/// Contents written into newly scaffolded `__init__.py` files.
pub const DEFAULT_INIT_CONTENTS: &str = "# Auto-generated __init__.py\n";

/// pdectl configuration (TOML).
///
/// Every section is optional; missing fields fall back to the layout of the
/// PDEBench dashboard project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub fix: FixConfig,
    pub migrate: MigrateConfig,
    pub scaffold: ScaffoldConfig,
    pub verify: VerifyConfig,
    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixConfig {
    /// Fixed list of files visited by `fix-imports`, in order.
    pub files: Vec<PathBuf>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            files: paths(&[
                "interfaces/streamlit/controllers/comparison_controller.py",
                "interfaces/streamlit/controllers/simulation_controller.py",
                "interfaces/streamlit/services/analytical_service.py",
                "interfaces/streamlit/services/numerical_service.py",
                "interfaces/streamlit/services/validation_service.py",
                "interfaces/streamlit/views/comparison_view.py",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MigrateConfig {
    /// Directories walked recursively for `*.py` files.
    pub directories: Vec<PathBuf>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            directories: paths(&["interfaces/streamlit", "core"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Directories that must be Python packages.
    pub packages: Vec<PathBuf>,
    pub init_contents: String,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            packages: paths(&[
                "interfaces",
                "interfaces/streamlit",
                "interfaces/streamlit/layout",
                "interfaces/streamlit/components",
                "interfaces/streamlit/styles",
                "interfaces/streamlit/state",
                "interfaces/streamlit/controllers",
                "interfaces/streamlit/services",
                "interfaces/streamlit/views",
                "core",
                "core/equations",
                "core/solvers",
            ]),
            init_contents: DEFAULT_INIT_CONTENTS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifyConfig {
    pub directories: Vec<PathBuf>,
    /// Dotted module names that must resolve to a file or package.
    pub modules: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            directories: paths(&["interfaces", "core"]),
            modules: [
                "core.equations.heat_equation",
                "core.solvers.analytical",
                "core.solvers.finite_difference",
                "core.solvers.comparison",
                "interfaces.streamlit.app",
                "interfaces.streamlit.layout.page_config",
                "interfaces.streamlit.controllers.simulation_controller",
                "interfaces.streamlit.controllers.comparison_controller",
                "interfaces.streamlit.views.dashboard_view",
            ]
            .iter()
            .map(|module| module.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LaunchConfig {
    /// Directory whose presence proves pdectl runs from the project root.
    pub marker_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub requirements: PathBuf,
    /// Interpreter used to create the venv (`<python> -m venv <venv_dir>`).
    pub python: String,
    /// Working directory for the dashboard process.
    pub app_dir: PathBuf,
    /// Dashboard argv; each element is a minijinja template.
    pub command: Vec<String>,
    pub install_timeout_secs: u64,
    /// Truncate captured venv/pip output beyond this many bytes.
    pub output_limit_bytes: usize,
    /// Re-run the install when `requirements.txt` no longer matches the stamp.
    pub reinstall_on_change: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            marker_dir: PathBuf::from("interfaces"),
            venv_dir: PathBuf::from("venv"),
            requirements: PathBuf::from("requirements.txt"),
            python: "python3".to_string(),
            app_dir: PathBuf::from("interfaces/streamlit"),
            command: vec![
                "{{ venv_bin }}/streamlit".to_string(),
                "run".to_string(),
                "app.py".to_string(),
            ],
            install_timeout_secs: 30 * 60,
            output_limit_bytes: 100_000,
            reinstall_on_change: false,
        }
    }
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure_paths("fix.files", &self.fix.files)?;
        ensure_paths("migrate.directories", &self.migrate.directories)?;
        ensure_paths("scaffold.packages", &self.scaffold.packages)?;
        ensure_paths("verify.directories", &self.verify.directories)?;
        if let Some(bad) = self
            .verify
            .modules
            .iter()
            .find(|module| !is_valid_module(module))
        {
            return Err(anyhow!("verify.modules: invalid module name {bad:?}"));
        }

        let launch = &self.launch;
        for (field, path) in [
            ("launch.marker_dir", &launch.marker_dir),
            ("launch.venv_dir", &launch.venv_dir),
            ("launch.requirements", &launch.requirements),
            ("launch.app_dir", &launch.app_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("{field} must not be empty"));
            }
        }
        if launch.python.trim().is_empty() {
            return Err(anyhow!("launch.python must not be empty"));
        }
        if launch.command.is_empty() || launch.command[0].trim().is_empty() {
            return Err(anyhow!("launch.command must be a non-empty array"));
        }
        if launch.install_timeout_secs == 0 {
            return Err(anyhow!("launch.install_timeout_secs must be > 0"));
        }
        if launch.output_limit_bytes == 0 {
            return Err(anyhow!("launch.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

fn ensure_paths(field: &str, items: &[PathBuf]) -> Result<()> {
    if items.iter().any(|path| path.as_os_str().is_empty()) {
        return Err(anyhow!("{field} must not contain empty paths"));
    }
    Ok(())
}

/// Resolve the config path: explicit `--config`, else `<root>/pdectl.toml`.
pub fn config_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => root.join(CONFIG_FILE),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = Config::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}
