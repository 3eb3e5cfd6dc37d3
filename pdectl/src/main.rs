//! Maintenance CLI for the PDEBench dashboard project.
//!
//! Rewrites relocated imports, scaffolds packages, verifies the layout, and
//! launches the dashboard inside a managed virtual environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use pdectl::core::diff::render_diff;
use pdectl::core::types::{FileStatus, FixReport, ScaffoldReport};
use pdectl::exit_codes;
use pdectl::fix::{fix_imports, migrate};
use pdectl::io::config::{Config, config_path, load_config};
use pdectl::io::process::SystemRunner;
use pdectl::io::rewrite::RewriteOptions;
use pdectl::io::scaffold::ensure_package_markers;
use pdectl::io::venv::{EnvPlan, create_spec, install_spec};
use pdectl::launch::{LaunchOptions, LaunchOutcome, launch};
use pdectl::logging;
use pdectl::verify::verify_project;

#[derive(Parser)]
#[command(
    name = "pdectl",
    version,
    about = "Import fixer, scaffolder, and dashboard launcher for the PDEBench project"
)]
struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (defaults to `<root>/pdectl.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Relocate `core.utils` / `backend.utils` imports in the fixed file list.
    FixImports(RewriteArgs),
    /// Apply the full package relocation table under the migrate directories.
    Migrate {
        #[command(flatten)]
        rewrite: RewriteArgs,
        /// Skip creating missing `__init__.py` files afterwards.
        #[arg(long)]
        no_scaffold: bool,
    },
    /// Create missing `__init__.py` files in the configured package directories.
    Scaffold {
        #[arg(long)]
        dry_run: bool,
    },
    /// Check directories, expected modules, and leftover legacy imports.
    Verify,
    /// Bootstrap the virtual environment and start the dashboard.
    Launch {
        /// Check and print the plan without creating or starting anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Clone, Copy)]
struct RewriteArgs {
    /// Report what would change without writing files.
    #[arg(long)]
    dry_run: bool,
    /// Print a line diff for every changed file.
    #[arg(long)]
    diff: bool,
    /// Print the report as JSON.
    #[arg(long, conflicts_with = "diff")]
    json: bool,
}

impl RewriteArgs {
    fn options(self) -> RewriteOptions {
        RewriteOptions {
            dry_run: self.dry_run,
            collect_changes: self.diff || self.json,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = resolve_root(cli.root.as_deref())?;
    let cfg = load_config(&config_path(&root, cli.config.as_deref()))?;

    match cli.command {
        Command::FixImports(args) => cmd_fix_imports(&root, &cfg, args),
        Command::Migrate {
            rewrite,
            no_scaffold,
        } => cmd_migrate(&root, &cfg, rewrite, !no_scaffold),
        Command::Scaffold { dry_run } => cmd_scaffold(&root, &cfg, dry_run),
        Command::Verify => cmd_verify(&root, &cfg),
        Command::Launch { dry_run } => cmd_launch(&root, &cfg, dry_run),
    }
}

/// Absolute project root. Child processes run with other working directories,
/// so a relative `--root` must not leak into their arguments.
fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => std::path::absolute(root)
            .with_context(|| format!("resolve project root {}", root.display())),
        None => std::env::current_dir().context("resolve current directory"),
    }
}

fn cmd_fix_imports(root: &Path, cfg: &Config, args: RewriteArgs) -> Result<i32> {
    let report = fix_imports(root, cfg, args.options());
    if args.json {
        print_json(&report)?;
    } else {
        print_fix_report("fix", &report, args.diff);
    }
    Ok(exit_codes::OK)
}

fn cmd_migrate(root: &Path, cfg: &Config, args: RewriteArgs, scaffold: bool) -> Result<i32> {
    let outcome = migrate(root, cfg, args.options(), scaffold)?;
    if args.json {
        print_json(&outcome)?;
    } else {
        print_fix_report("migrate", &outcome.report, args.diff);
        if let Some(scaffold) = &outcome.scaffold {
            print_scaffold_report(scaffold);
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_scaffold(root: &Path, cfg: &Config, dry_run: bool) -> Result<i32> {
    let report = ensure_package_markers(
        root,
        &cfg.scaffold.packages,
        &cfg.scaffold.init_contents,
        dry_run,
    )?;
    print_scaffold_report(&report);
    Ok(exit_codes::OK)
}

fn cmd_verify(root: &Path, cfg: &Config) -> Result<i32> {
    let outcome = verify_project(root, cfg);
    if outcome.is_clean() {
        println!("verify: ok");
        return Ok(exit_codes::OK);
    }
    for finding in &outcome.findings {
        println!("verify: {finding}");
    }
    println!("verify: findings={}", outcome.findings.len());
    Ok(exit_codes::INVALID)
}

fn cmd_launch(root: &Path, cfg: &Config, dry_run: bool) -> Result<i32> {
    let outcome = launch(root, &cfg.launch, &SystemRunner, LaunchOptions { dry_run })?;
    match outcome {
        LaunchOutcome::Planned(plan) => {
            println!(
                "launch: env={} venv={}",
                plan.env.label(),
                plan.env_request.layout.dir.display()
            );
            match plan.env {
                EnvPlan::Create { install } => {
                    println!("launch: would run {}", create_spec(&plan.env_request).display());
                    if install {
                        println!("launch: would run {}", install_spec(&plan.env_request).display());
                    }
                }
                EnvPlan::Reinstall => {
                    println!("launch: would run {}", install_spec(&plan.env_request).display());
                }
                EnvPlan::Reuse => {}
            }
            println!(
                "launch: would run {} (cwd={})",
                plan.dashboard.display(),
                plan.dashboard.cwd.display()
            );
            Ok(exit_codes::OK)
        }
        LaunchOutcome::Exited { code, .. } => Ok(code.unwrap_or(exit_codes::INVALID)),
    }
}

fn print_fix_report(label: &str, report: &FixReport, diff: bool) {
    for file in &report.files {
        let mut line = format!(
            "{label}: path={} status={}",
            file.path.display(),
            file.status.label()
        );
        match &file.status {
            FileStatus::Rewritten { replacements } => {
                line.push_str(&format!(" replacements={replacements}"));
            }
            FileStatus::Failed { reason } => line.push_str(&format!(" reason={reason:?}")),
            FileStatus::Unchanged | FileStatus::Missing => {}
        }
        println!("{line}");
        if diff {
            print!(
                "{}",
                render_diff(&file.path.display().to_string(), &file.changes)
            );
        }
    }
    println!(
        "{label}: rewritten={} unchanged={} missing={} failed={} replacements={} dry_run={}",
        report.rewritten(),
        report.unchanged(),
        report.missing(),
        report.failed(),
        report.replacements(),
        report.dry_run
    );
}

fn print_scaffold_report(report: &ScaffoldReport) {
    let verb = if report.dry_run { "would_create" } else { "created" };
    for path in &report.created {
        println!("scaffold: {verb}={}", path.display());
    }
    println!(
        "scaffold: created={} existing={} dry_run={}",
        report.created.len(),
        report.existing.len(),
        report.dry_run
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize report")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fix_imports_flags() {
        let cli = Cli::parse_from(["pdectl", "fix-imports", "--dry-run", "--diff"]);
        match cli.command {
            Command::FixImports(args) => {
                assert!(args.dry_run);
                assert!(args.diff);
                assert!(!args.json);
                assert_eq!(
                    args.options(),
                    RewriteOptions {
                        dry_run: true,
                        collect_changes: true
                    }
                );
            }
            _ => panic!("expected fix-imports"),
        }
    }

    #[test]
    fn parse_global_root_after_subcommand() {
        let cli = Cli::parse_from(["pdectl", "launch", "--root", "/proj", "--dry-run"]);
        assert_eq!(cli.root, Some(PathBuf::from("/proj")));
        assert!(matches!(cli.command, Command::Launch { dry_run: true }));
    }

    #[test]
    fn parse_migrate_no_scaffold() {
        let cli = Cli::parse_from(["pdectl", "migrate", "--no-scaffold"]);
        assert!(matches!(
            cli.command,
            Command::Migrate {
                no_scaffold: true,
                ..
            }
        ));
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let root = resolve_root(Some(Path::new("proj/sub"))).expect("resolve");
        assert!(root.is_absolute());
        assert!(root.ends_with("proj/sub"));
    }

    #[test]
    fn json_conflicts_with_diff() {
        assert!(Cli::try_parse_from(["pdectl", "fix-imports", "--json", "--diff"]).is_err());
    }
}
