//! Classpath command - print the dynamic-load classpath

use super::{load_project, print_warnings, ProjectOptions};
use anyhow::{Context, Result};
use std::path::PathBuf;
use truffle_build::ClasspathMode;

pub fn run(
    options: &ProjectOptions,
    mode: ClasspathMode,
    install_root: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut project = load_project(options)?;
    project.close().context("Failed to configure project")?;

    let classpath = match (&install_root, mode) {
        (Some(root), ClasspathMode::Archived) => project.classpath_in(root),
        _ => project.classpath(mode),
    }
    .context("Failed to compute classpath")?;

    print_warnings(&project);
    if json {
        println!("{}", serde_json::to_string_pretty(&classpath)?);
    } else {
        let separator = if cfg!(windows) { ";" } else { ":" };
        println!("{}", classpath.join(separator));
    }
    Ok(())
}
