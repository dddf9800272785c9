//! Tasks command - list the wired task graph

use super::{load_project, print_warnings, ProjectOptions};
use anyhow::{Context, Result};

pub fn run(options: &ProjectOptions, json: bool) -> Result<()> {
    let mut project = load_project(options)?;
    project.close().context("Failed to configure project")?;
    let order = project
        .tasks()
        .execution_order()
        .context("Failed to order tasks")?;

    if json {
        let tasks: Vec<_> = order
            .iter()
            .filter_map(|name| project.task(name))
            .map(|task| {
                serde_json::json!({
                    "name": task.name,
                    "type": task.kind.type_name(),
                    "group": task.group,
                    "description": task.description,
                    "depends_on": task.depends_on,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "tasks": tasks }))?
        );
        return Ok(());
    }

    print_warnings(&project);
    for task in order.iter().filter_map(|name| project.task(name)) {
        let mut line = format!("{} ({})", task.name, task.kind.type_name());
        if let Some(description) = &task.description {
            line.push_str(&format!(" - {}", description));
        }
        println!("{}", line);
        if !task.depends_on.is_empty() {
            println!("    depends on: {}", task.depends_on.join(", "));
        }
    }
    Ok(())
}
