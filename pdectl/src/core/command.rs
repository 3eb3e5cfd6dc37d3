//! Rendering of the configured dashboard command line.

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, UndefinedBehavior, context};

/// Values exposed to command templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVars {
    pub root: String,
    pub venv: String,
    pub venv_bin: String,
    pub app_dir: String,
    pub python: String,
}

/// Render every element of `templates`; the first element is the program.
///
/// Unknown variables are an error rather than silently rendering empty.
pub fn render_command(templates: &[String], vars: &CommandVars) -> Result<Vec<String>> {
    if templates.is_empty() {
        return Err(anyhow!("launch command is empty"));
    }
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let ctx = context! {
        root => &vars.root,
        venv => &vars.venv,
        venv_bin => &vars.venv_bin,
        app_dir => &vars.app_dir,
        python => &vars.python,
    };
    let rendered = templates
        .iter()
        .map(|template| {
            env.render_str(template, &ctx)
                .with_context(|| format!("render launch command element {template:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if rendered[0].trim().is_empty() {
        return Err(anyhow!("launch command program renders empty"));
    }
    Ok(rendered)
}
