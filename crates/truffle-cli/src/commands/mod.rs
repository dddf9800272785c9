//! Command implementations

pub mod classpath;
pub mod targets;
pub mod tasks;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use truffle_build::Project;
use truffle_config::ConfigLoader;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// Directory to start the truffle.toml search from
    pub project_dir: Option<PathBuf>,
    /// `--graal-version` override
    pub graal_version: Option<String>,
}

/// Load truffle.toml and build the project
pub fn load_project(options: &ProjectOptions) -> Result<Project> {
    let start = match &options.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let start = start
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", start.display()))?;

    let config = ConfigLoader::new()
        .load_from_directory(&start)
        .context("Failed to load configuration")?;
    if !config.is_project() {
        bail!(
            "No truffle.toml found in {} or any parent directory",
            start.display()
        );
    }

    let mut project = Project::from_config(&config).context("Invalid project configuration")?;
    if let Some(version) = &options.graal_version {
        project.graal_mut().set_version(version.as_str())?;
    }
    tracing::debug!(
        "Loaded project {} from {}",
        project.name(),
        project.root().display()
    );
    Ok(project)
}

/// Print collected warnings to stderr
pub fn print_warnings(project: &Project) {
    for warning in project.warnings() {
        eprintln!("warning: {}", warning);
    }
}
