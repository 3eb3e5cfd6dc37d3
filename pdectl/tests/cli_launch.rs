//! CLI tests for `pdectl launch` that never reach a real interpreter.

use std::path::Path;
use std::process::Command;

use pdectl::exit_codes;
use pdectl::test_support::TestProject;

#[test]
fn launch_outside_project_root_exits_invalid_without_side_effects() {
    let project = TestProject::new().expect("project");
    project
        .write("requirements.txt", "streamlit\n")
        .expect("requirements");

    let output = Command::new(env!("CARGO_BIN_EXE_pdectl"))
        .current_dir(project.root())
        .arg("launch")
        .output()
        .expect("run pdectl");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'interfaces' directory not found"), "{stderr}");
    assert!(!project.path("venv").exists());
}

#[test]
fn launch_dry_run_prints_plan() {
    let project = TestProject::new()
        .expect("project")
        .with_legacy_dashboard()
        .expect("layout");

    let output = Command::new(env!("CARGO_BIN_EXE_pdectl"))
        .args(["launch", "--dry-run", "--root"])
        .arg(project.root())
        .output()
        .expect("run pdectl");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("launch: env=created"), "{stdout}");
    assert!(stdout.contains("-m venv"), "{stdout}");
    assert!(stdout.contains("install -r"), "{stdout}");
    assert!(stdout.contains("streamlit run app.py"), "{stdout}");
    assert!(!project.path("venv").exists());
}

#[test]
fn launch_dry_run_resolves_relative_root() {
    let project = TestProject::new()
        .expect("project")
        .with_legacy_dashboard()
        .expect("layout");
    let parent = project.root().parent().expect("tempdir parent");
    let name = project.root().file_name().expect("tempdir name");

    let output = Command::new(env!("CARGO_BIN_EXE_pdectl"))
        .current_dir(parent)
        .args(["launch", "--dry-run", "--root"])
        .arg(name)
        .output()
        .expect("run pdectl");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let venv = stdout
        .lines()
        .find_map(|line| line.strip_prefix("launch: env=created venv="))
        .expect("env line");
    let venv = Path::new(venv);
    assert!(venv.is_absolute(), "{stdout}");
    assert!(venv.ends_with(Path::new(name).join("venv")), "{stdout}");
}
