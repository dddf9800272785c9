/// Compiler preparation (`prepareCompiler`)
use crate::configuration::{ConfigurationGraph, ConfigurationRole};
use crate::copy::{copy_flat, CopyReport};
use crate::error::BuildResult;
use crate::resolver::ArtifactResolver;
use std::path::{Path, PathBuf};

/// Resolve the compiler configuration
pub fn compiler_files(
    graph: &ConfigurationGraph,
    resolver: &dyn ArtifactResolver,
) -> BuildResult<Vec<PathBuf>> {
    graph.resolve(ConfigurationRole::GraalCompiler.name(), resolver)
}

/// Copy the resolved compiler flat into `compiler_dir`
///
/// Files whose content is unchanged are left alone, so a second run reports
/// the task as up to date.
pub fn prepare_compiler(
    graph: &ConfigurationGraph,
    resolver: &dyn ArtifactResolver,
    compiler_dir: &Path,
) -> BuildResult<CopyReport> {
    let files = compiler_files(graph, resolver)?;
    let report = copy_flat(&files, compiler_dir)?;
    tracing::debug!(
        "Prepared compiler in {}: {} copied, {} up to date",
        compiler_dir.display(),
        report.copied.len(),
        report.up_to_date.len()
    );
    Ok(report)
}
