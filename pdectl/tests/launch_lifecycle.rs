//! Library-level launch scenarios driven through a scripted command runner.
//!
//! These cover environment reuse across launches, reinstall on changed
//! requirements, recovery from a failed install, and exit-code propagation
//! without spawning Python.

use std::fs;

use pdectl::io::config::LaunchConfig;
use pdectl::io::venv::EnvPlan;
use pdectl::launch::{LaunchOptions, LaunchOutcome, launch};
use pdectl::test_support::{ScriptedRunner, TestProject};

fn dashboard_project() -> TestProject {
    TestProject::new()
        .expect("project")
        .with_legacy_dashboard()
        .expect("layout")
}

#[test]
fn second_launch_reuses_environment() {
    let project = dashboard_project();
    let runner = ScriptedRunner::new();
    let cfg = LaunchConfig::default();

    let first = launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("first");
    let second = launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("second");

    assert_eq!(
        first,
        LaunchOutcome::Exited {
            env: EnvPlan::Create { install: true },
            code: Some(0),
        }
    );
    assert_eq!(
        second,
        LaunchOutcome::Exited {
            env: EnvPlan::Reuse,
            code: Some(0),
        }
    );
    assert_eq!(runner.venv_creations(), 1);
    // create + install on the first launch only
    assert_eq!(runner.captured().len(), 2);
    assert_eq!(runner.interactive_calls().len(), 2);
}

#[test]
fn changed_requirements_trigger_reinstall_when_enabled() {
    let project = dashboard_project();
    let runner = ScriptedRunner::new();
    let cfg = LaunchConfig {
        reinstall_on_change: true,
        ..LaunchConfig::default()
    };

    launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("first");
    let unchanged = launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("second");
    assert!(matches!(
        unchanged,
        LaunchOutcome::Exited {
            env: EnvPlan::Reuse,
            ..
        }
    ));

    fs::write(
        project.path("requirements.txt"),
        "numpy\nstreamlit\nplotly\n",
    )
    .expect("update requirements");
    let changed = launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("third");
    assert!(matches!(
        changed,
        LaunchOutcome::Exited {
            env: EnvPlan::Reinstall,
            ..
        }
    ));
    assert_eq!(runner.venv_creations(), 1);
    assert_eq!(runner.captured().len(), 3);
}

#[test]
fn dashboard_exit_code_is_returned() {
    let project = dashboard_project();
    let runner = ScriptedRunner::new().with_dashboard_code(Some(7));

    let outcome = launch(
        project.root(),
        &LaunchConfig::default(),
        &runner,
        LaunchOptions::default(),
    )
    .expect("launch");
    assert!(matches!(outcome, LaunchOutcome::Exited { code: Some(7), .. }));
}

#[test]
fn failed_install_stops_before_dashboard() {
    let project = dashboard_project();
    let runner = ScriptedRunner::new().with_install_failure("ERROR: resolution impossible");

    let err = launch(
        project.root(),
        &LaunchConfig::default(),
        &runner,
        LaunchOptions::default(),
    )
    .expect_err("install fails");
    assert!(format!("{err:#}").contains("resolution impossible"));
    assert!(runner.interactive_calls().is_empty());
}

#[test]
fn launch_after_failed_install_repopulates_environment() {
    let project = dashboard_project();
    let cfg = LaunchConfig::default();

    let failing = ScriptedRunner::new().with_install_failure("ERROR: network unreachable");
    launch(project.root(), &cfg, &failing, LaunchOptions::default()).expect_err("install fails");
    assert!(project.path("venv").is_dir());

    let runner = ScriptedRunner::new();
    let outcome = launch(project.root(), &cfg, &runner, LaunchOptions::default()).expect("retry");
    assert_eq!(
        outcome,
        LaunchOutcome::Exited {
            env: EnvPlan::Reinstall,
            code: Some(0),
        }
    );
    assert_eq!(runner.venv_creations(), 0);
    let captured = runner.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].args[0], "install");
    assert_eq!(runner.interactive_calls().len(), 1);
    assert!(project.path("venv/.pdectl-requirements").is_file());
}
