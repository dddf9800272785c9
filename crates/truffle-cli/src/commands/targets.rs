//! Target commands - run build tasks and report the outcome

use super::{load_project, print_warnings, ProjectOptions};
use anyhow::{bail, Context, Result};
use truffle_build::{BuildReport, Project, TaskKind, TaskStatus};

/// Run the given tasks (with their dependencies) and print a report
pub fn run<S: AsRef<str>>(options: &ProjectOptions, targets: &[S], json: bool) -> Result<()> {
    let mut project = load_project(options)?;
    execute(&mut project, targets, json)
}

/// Run the named native image tasks, or all of them
pub fn native_images(options: &ProjectOptions, names: Vec<String>, json: bool) -> Result<()> {
    let mut project = load_project(options)?;
    project.close().context("Failed to configure project")?;

    let names = if names.is_empty() {
        project
            .tasks()
            .tasks()
            .filter(|t| matches!(t.kind, TaskKind::NativeImage(_)))
            .map(|t| t.name.clone())
            .collect()
    } else {
        names
    };
    if names.is_empty() {
        bail!("The project declares no native image targets");
    }
    execute(&mut project, names.as_slice(), json)
}

fn execute<S: AsRef<str>>(project: &mut Project, targets: &[S], json: bool) -> Result<()> {
    let results = project
        .execute_all(targets)
        .context("Failed to configure project")?;
    let report = BuildReport::new(&results, project.warnings());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_warnings(project);
        print_report(&report);
    }

    if !report.success() {
        let failed: Vec<&str> = report
            .targets
            .iter()
            .filter(|t| !t.success)
            .map(|t| t.target.as_str())
            .collect();
        bail!("Build failed: {}", failed.join(", "));
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    for target in &report.targets {
        for outcome in &target.outcomes {
            let status = match outcome.status {
                TaskStatus::Executed => "done",
                TaskStatus::UpToDate => "up to date",
            };
            println!("  {} ({})", outcome.task, status);
            for output in &outcome.outputs {
                println!("      {}", output.display());
            }
        }
        if let Some(error) = &target.error {
            println!("  {} FAILED: {}", target.target, error);
        }
    }
}
