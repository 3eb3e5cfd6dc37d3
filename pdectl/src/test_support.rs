//! Test-only helpers: temporary project trees and a scripted command runner.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::io::process::{CapturedOutput, CommandRunner, CommandSpec};

/// A throwaway project root.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create tempdir")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn mkdir(&self, rel: &str) -> Result<PathBuf> {
        let path = self.path(rel);
        fs::create_dir_all(&path).with_context(|| format!("create directory {}", path.display()))?;
        Ok(path)
    }

    /// Lay out a pre-migration dashboard tree with legacy imports.
    pub fn with_legacy_dashboard(self) -> Result<Self> {
        self.write(
            "interfaces/streamlit/controllers/comparison_controller.py",
            "from backend.utils.comparison import compare_solutions\n\
             from frontend.state.session import get_solution_data\n",
        )?;
        self.write(
            "interfaces/streamlit/views/comparison_view.py",
            "import streamlit as st\n\
             from components.plots import create_error_plot\n",
        )?;
        self.write(
            "interfaces/streamlit/app.py",
            "from layout.page_config import setup_page\n\
             from controllers.simulation_controller import SimulationController\n",
        )?;
        self.write(
            "core/solvers/comparison.py",
            "import numpy as np\nfrom core.utils import norms\n",
        )?;
        self.write("requirements.txt", "numpy\nstreamlit\n")?;
        Ok(self)
    }
}

/// A command runner that records invocations and fakes their effects.
///
/// `python -m venv <dir>` creates `<dir>` (and its bin directory); every other
/// captured command succeeds unless an install failure was scripted.
#[derive(Default)]
pub struct ScriptedRunner {
    captured: RefCell<Vec<CommandSpec>>,
    interactive: RefCell<Vec<CommandSpec>>,
    install_failure: Option<String>,
    dashboard_code: Option<i32>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            dashboard_code: Some(0),
            ..Self::default()
        }
    }

    /// Make `pip install` exit 1 with `stderr`.
    pub fn with_install_failure(mut self, stderr: &str) -> Self {
        self.install_failure = Some(stderr.to_string());
        self
    }

    pub fn with_dashboard_code(mut self, code: Option<i32>) -> Self {
        self.dashboard_code = code;
        self
    }

    pub fn captured(&self) -> Vec<CommandSpec> {
        self.captured.borrow().clone()
    }

    pub fn interactive_calls(&self) -> Vec<CommandSpec> {
        self.interactive.borrow().clone()
    }

    /// Number of `-m venv` invocations seen so far.
    pub fn venv_creations(&self) -> usize {
        self.captured
            .borrow()
            .iter()
            .filter(|spec| is_venv_create(spec))
            .count()
    }
}

fn is_venv_create(spec: &CommandSpec) -> bool {
    spec.args.len() == 3 && spec.args[0] == "-m" && spec.args[1] == "venv"
}

impl CommandRunner for ScriptedRunner {
    fn capture(
        &self,
        spec: &CommandSpec,
        _timeout: Duration,
        _output_limit_bytes: usize,
    ) -> Result<CapturedOutput> {
        self.captured.borrow_mut().push(spec.clone());
        if is_venv_create(spec) {
            let dir = spec.cwd.join(&spec.args[2]);
            fs::create_dir_all(dir.join("bin")).context("fake venv")?;
            return Ok(CapturedOutput {
                code: Some(0),
                ..CapturedOutput::default()
            });
        }
        if spec.args.first().is_some_and(|arg| arg == "install")
            && let Some(stderr) = &self.install_failure
        {
            return Ok(CapturedOutput {
                code: Some(1),
                stderr: stderr.as_bytes().to_vec(),
                ..CapturedOutput::default()
            });
        }
        Ok(CapturedOutput {
            code: Some(0),
            ..CapturedOutput::default()
        })
    }

    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        self.interactive.borrow_mut().push(spec.clone());
        Ok(self.dashboard_code)
    }
}
