//! Python virtual environment bootstrap and reuse.
//!
//! The environment is created once (`<python> -m venv`, then `pip install -r`)
//! and reused on later launches. After a successful install the requirements
//! hash is stamped inside the venv. A venv without a stamp never finished its
//! install and is repopulated; a changed `requirements.txt` triggers a
//! reinstall when configured.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::process::{CommandRunner, CommandSpec};

const STAMP_FILE: &str = ".pdectl-requirements";
const STDERR_TAIL_BYTES: usize = 4_000;

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

/// Canonical paths inside a venv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    pub dir: PathBuf,
    pub bin_dir: PathBuf,
    pub stamp_path: PathBuf,
}

impl VenvLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            bin_dir: dir.join(BIN_DIR),
            stamp_path: dir.join(STAMP_FILE),
            dir,
        }
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Path of an executable installed in the venv (`pip`, `streamlit`, ...).
    pub fn executable(&self, name: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
    }
}

/// Short content hash of `requirements.txt`; `None` if the file is missing.
pub fn requirements_hash(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let digest = Sha256::digest(&contents);
    Ok(Some(hex::encode(&digest[..16])))
}

pub fn read_stamp(layout: &VenvLayout) -> Option<String> {
    fs::read_to_string(&layout.stamp_path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn write_stamp(layout: &VenvLayout, hash: &str) -> Result<()> {
    fs::write(&layout.stamp_path, format!("{hash}\n"))
        .with_context(|| format!("write {}", layout.stamp_path.display()))
}

/// What `ensure_env` will do (or did) with the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvPlan {
    /// No venv yet: create it, then install when requirements exist.
    Create { install: bool },
    /// Venv exists and is used as-is.
    Reuse,
    /// Venv exists but was never fully populated, or requirements changed
    /// since the last install.
    Reinstall,
}

impl EnvPlan {
    pub fn label(self) -> &'static str {
        match self {
            EnvPlan::Create { .. } => "created",
            EnvPlan::Reuse => "reused",
            EnvPlan::Reinstall => "reinstalled",
        }
    }
}

/// Inputs for provisioning the launch environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRequest {
    pub root: PathBuf,
    pub layout: VenvLayout,
    pub requirements: PathBuf,
    pub python: String,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
    pub reinstall_on_change: bool,
}

/// Decide how to bring the environment up without touching anything.
pub fn plan_env(request: &EnvRequest) -> Result<EnvPlan> {
    let hash = requirements_hash(&request.requirements)?;
    if !request.layout.exists() {
        return Ok(EnvPlan::Create {
            install: hash.is_some(),
        });
    }
    let Some(hash) = hash else {
        return Ok(EnvPlan::Reuse);
    };
    match read_stamp(&request.layout) {
        // No completed install recorded, e.g. a previous install failed.
        None => Ok(EnvPlan::Reinstall),
        Some(stamp) if request.reinstall_on_change && stamp != hash => Ok(EnvPlan::Reinstall),
        Some(_) => Ok(EnvPlan::Reuse),
    }
}

/// Create or reuse the environment, returning the plan that was carried out.
pub fn ensure_env<R: CommandRunner>(runner: &R, request: &EnvRequest) -> Result<EnvPlan> {
    let plan = plan_env(request)?;
    debug!(?plan, venv = %request.layout.dir.display(), "environment plan");
    match plan {
        EnvPlan::Reuse => {
            info!(venv = %request.layout.dir.display(), "reusing environment");
        }
        EnvPlan::Create { install } => {
            create_venv(runner, request)?;
            if install {
                install_requirements(runner, request)?;
            } else {
                warn!(
                    requirements = %request.requirements.display(),
                    "requirements file missing, skipping install"
                );
            }
        }
        EnvPlan::Reinstall => {
            info!("requirements changed since last install");
            install_requirements(runner, request)?;
        }
    }
    Ok(plan)
}

/// Command that creates the venv.
pub fn create_spec(request: &EnvRequest) -> CommandSpec {
    CommandSpec::new(&request.python, &request.root)
        .arg("-m")
        .arg("venv")
        .arg(request.layout.dir.as_os_str())
}

/// Command that installs requirements into the venv.
pub fn install_spec(request: &EnvRequest) -> CommandSpec {
    CommandSpec::new(request.layout.executable("pip"), &request.root)
        .arg("install")
        .arg("-r")
        .arg(request.requirements.as_os_str())
}

fn create_venv<R: CommandRunner>(runner: &R, request: &EnvRequest) -> Result<()> {
    info!(venv = %request.layout.dir.display(), "creating environment");
    run_checked(runner, &create_spec(request), request, "create virtual environment")?;
    if !request.layout.exists() {
        return Err(anyhow!(
            "create virtual environment: {} was not created",
            request.layout.dir.display()
        ));
    }
    Ok(())
}

fn install_requirements<R: CommandRunner>(runner: &R, request: &EnvRequest) -> Result<()> {
    info!(requirements = %request.requirements.display(), "installing requirements");
    run_checked(runner, &install_spec(request), request, "install requirements")?;
    if let Some(hash) = requirements_hash(&request.requirements)? {
        write_stamp(&request.layout, &hash)?;
    }
    Ok(())
}

fn run_checked<R: CommandRunner>(
    runner: &R,
    spec: &CommandSpec,
    request: &EnvRequest,
    what: &str,
) -> Result<()> {
    let output = runner
        .capture(spec, request.timeout, request.output_limit_bytes)
        .with_context(|| what.to_string())?;
    if output.timed_out {
        return Err(anyhow!(
            "{what}: timed out after {}s ({})",
            request.timeout.as_secs(),
            spec.display()
        ));
    }
    if !output.success() {
        let code = output
            .code
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        let tail = output.stderr_tail(STDERR_TAIL_BYTES);
        return Err(anyhow!(
            "{what}: `{}` exited with {code}{}",
            spec.display(),
            if tail.is_empty() {
                String::new()
            } else {
                format!("\n{tail}")
            }
        ));
    }
    Ok(())
}
