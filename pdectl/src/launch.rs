//! Orchestration for `pdectl launch`.
//!
//! Order matters: the marker check runs before anything touches the
//! filesystem, so launching from the wrong directory has no side effects.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::core::command::{CommandVars, render_command};
use crate::io::config::LaunchConfig;
use crate::io::process::{CommandRunner, CommandSpec};
use crate::io::venv::{EnvPlan, EnvRequest, VenvLayout, ensure_env, plan_env};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Check and plan only; create nothing and start nothing.
    pub dry_run: bool,
}

/// Everything `launch` will do, resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub env: EnvPlan,
    pub env_request: EnvRequest,
    pub dashboard: CommandSpec,
}

/// Result of a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Dry run: what would have happened.
    Planned(LaunchPlan),
    /// The dashboard ran and exited.
    Exited { env: EnvPlan, code: Option<i32> },
}

/// Fail unless `root` contains the marker directory.
pub fn check_marker(root: &Path, cfg: &LaunchConfig) -> Result<()> {
    let marker = root.join(&cfg.marker_dir);
    if !marker.is_dir() {
        return Err(anyhow!(
            "'{}' directory not found in {}; run pdectl launch from the project root",
            cfg.marker_dir.display(),
            root.display()
        ));
    }
    Ok(())
}

/// Verify the working directory, ensure the environment, and run the dashboard.
pub fn launch<R: CommandRunner>(
    root: &Path,
    cfg: &LaunchConfig,
    runner: &R,
    options: LaunchOptions,
) -> Result<LaunchOutcome> {
    check_marker(root, cfg)?;

    let env_request = env_request(root, cfg);
    let dashboard = dashboard_spec(root, cfg, &env_request.layout)?;

    if options.dry_run {
        let env = plan_env(&env_request)?;
        debug!(?env, "dry run, not launching");
        return Ok(LaunchOutcome::Planned(LaunchPlan {
            env,
            env_request,
            dashboard,
        }));
    }

    let env = ensure_env(runner, &env_request).context("prepare environment")?;

    if !dashboard.cwd.is_dir() {
        return Err(anyhow!(
            "app directory {} not found",
            dashboard.cwd.display()
        ));
    }
    info!(command = %dashboard.display(), cwd = %dashboard.cwd.display(), "starting dashboard");
    let code = runner
        .interactive(&dashboard)
        .context("start dashboard")?;
    Ok(LaunchOutcome::Exited { env, code })
}

fn env_request(root: &Path, cfg: &LaunchConfig) -> EnvRequest {
    EnvRequest {
        root: root.to_path_buf(),
        layout: VenvLayout::new(root.join(&cfg.venv_dir)),
        requirements: root.join(&cfg.requirements),
        python: cfg.python.clone(),
        timeout: Duration::from_secs(cfg.install_timeout_secs),
        output_limit_bytes: cfg.output_limit_bytes,
        reinstall_on_change: cfg.reinstall_on_change,
    }
}

/// Render the dashboard command with the venv activated for the child.
fn dashboard_spec(root: &Path, cfg: &LaunchConfig, layout: &VenvLayout) -> Result<CommandSpec> {
    let app_dir = root.join(&cfg.app_dir);
    let vars = CommandVars {
        root: root.display().to_string(),
        venv: layout.dir.display().to_string(),
        venv_bin: layout.bin_dir.display().to_string(),
        app_dir: app_dir.display().to_string(),
        python: cfg.python.clone(),
    };
    let argv = render_command(&cfg.command, &vars)?;
    let mut spec = CommandSpec::new(&argv[0], app_dir)
        .env("VIRTUAL_ENV", layout.dir.as_os_str())
        .env("PATH", activated_path(&layout.bin_dir)?)
        .env_remove("PYTHONHOME");
    for arg in &argv[1..] {
        spec = spec.arg(arg);
    }
    Ok(spec)
}

/// `PATH` with the venv bin directory first, as `activate` would set it.
fn activated_path(bin_dir: &Path) -> Result<OsString> {
    let mut entries: Vec<PathBuf> = vec![bin_dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries).context("build PATH for dashboard")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, TestProject};

    #[test]
    fn wrong_directory_fails_without_side_effects() {
        let project = TestProject::new().expect("project");
        let runner = ScriptedRunner::new();

        let err = launch(
            project.root(),
            &LaunchConfig::default(),
            &runner,
            LaunchOptions::default(),
        )
        .expect_err("marker missing");
        assert!(err.to_string().contains("'interfaces' directory not found"));
        assert!(runner.captured().is_empty());
        assert!(runner.interactive_calls().is_empty());
        assert!(!project.path("venv").exists());
    }

    #[test]
    fn dashboard_runs_in_app_dir_with_venv_activated() {
        let project = TestProject::new()
            .expect("project")
            .with_legacy_dashboard()
            .expect("layout");
        let runner = ScriptedRunner::new();

        let outcome = launch(
            project.root(),
            &LaunchConfig::default(),
            &runner,
            LaunchOptions::default(),
        )
        .expect("launch");
        assert_eq!(
            outcome,
            LaunchOutcome::Exited {
                env: EnvPlan::Create { install: true },
                code: Some(0),
            }
        );

        let calls = runner.interactive_calls();
        assert_eq!(calls.len(), 1);
        let dashboard = &calls[0];
        let layout = VenvLayout::new(project.path("venv"));
        assert_eq!(dashboard.cwd, project.path("interfaces/streamlit"));
        assert_eq!(
            PathBuf::from(&dashboard.program),
            layout.bin_dir.join("streamlit")
        );
        assert_eq!(dashboard.args, vec![OsString::from("run"), OsString::from("app.py")]);
        assert!(
            dashboard
                .envs
                .contains(&(OsString::from("VIRTUAL_ENV"), layout.dir.clone().into_os_string()))
        );
        let path = dashboard
            .envs
            .iter()
            .find(|(key, _)| key == "PATH")
            .map(|(_, value)| value.clone())
            .expect("PATH set");
        assert_eq!(
            std::env::split_paths(&path).next(),
            Some(layout.bin_dir.clone())
        );
    }

    #[test]
    fn dry_run_plans_without_running_anything() {
        let project = TestProject::new()
            .expect("project")
            .with_legacy_dashboard()
            .expect("layout");
        let runner = ScriptedRunner::new();

        let outcome = launch(
            project.root(),
            &LaunchConfig::default(),
            &runner,
            LaunchOptions { dry_run: true },
        )
        .expect("launch");
        match outcome {
            LaunchOutcome::Planned(plan) => {
                assert_eq!(plan.env, EnvPlan::Create { install: true });
                assert_eq!(plan.dashboard.args.len(), 2);
            }
            other => panic!("expected plan, got {other:?}"),
        }
        assert!(runner.captured().is_empty());
        assert!(runner.interactive_calls().is_empty());
        assert!(!project.path("venv").exists());
    }

    #[test]
    fn missing_app_dir_is_an_error_after_env_setup() {
        let project = TestProject::new().expect("project");
        project.mkdir("interfaces").expect("marker");
        let runner = ScriptedRunner::new();

        let err = launch(
            project.root(),
            &LaunchConfig::default(),
            &runner,
            LaunchOptions::default(),
        )
        .expect_err("no app dir");
        assert!(err.to_string().contains("app directory"));
        assert_eq!(runner.venv_creations(), 1);
        assert!(runner.interactive_calls().is_empty());
    }
}
