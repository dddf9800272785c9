//! Distribution install (`installDist`)
use crate::classpath::LIB_DIR;
use crate::copy::{copy_flat, copy_tree, CopyReport};
use crate::error::{BuildError, BuildResult};
use crate::script::COMPILER_DIR_NAME;
use crate::targets::{DistContent, DistributionSpec};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory of a distribution holding the launchers
pub const BIN_DIR: &str = "bin";

/// Files a distribution is assembled from
#[derive(Debug, Clone, Default)]
pub struct DistributionInputs {
    /// Resolved runtime classpath
    pub runtime_libs: Vec<PathBuf>,
    /// The project archive
    pub project_archive: Option<PathBuf>,
    /// Resolved compiler files
    pub compiler_files: Vec<PathBuf>,
}

/// Synchronize the install directory with the distribution contents
///
/// Files left over from earlier installs that are no longer part of the
/// distribution are removed.
pub fn install(spec: &DistributionSpec, inputs: &DistributionInputs) -> BuildResult<CopyReport> {
    let root = &spec.install_dir;
    let lib = root.join(LIB_DIR);
    let mut report = CopyReport::default();

    for content in &spec.contents {
        match content {
            DistContent::RuntimeLibs => report.merge(copy_flat(&inputs.runtime_libs, &lib)?),
            DistContent::ProjectArchive => {
                if let Some(archive) = &inputs.project_archive {
                    report.merge(copy_flat(std::slice::from_ref(archive), &lib)?);
                }
            }
            DistContent::Scripts(dir) => {
                if dir.is_dir() {
                    report.merge(copy_tree(dir, &root.join(BIN_DIR))?);
                }
            }
            DistContent::Compiler => report.merge(copy_flat(
                &inputs.compiler_files,
                &root.join(COMPILER_DIR_NAME),
            )?),
        }
    }

    remove_stale(root, &report)?;
    tracing::debug!(
        "Installed distribution '{}' to {}",
        spec.name,
        root.display()
    );
    Ok(report)
}

fn remove_stale(root: &std::path::Path, report: &CopyReport) -> BuildResult<()> {
    let keep: HashSet<PathBuf> = report.files().into_iter().collect();
    let stale: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && !keep.contains(e.path()))
        .map(|e| e.into_path())
        .collect();
    for file in stale {
        tracing::debug!("Removing stale {}", file.display());
        fs::remove_file(&file).map_err(|e| BuildError::io(&file, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_layout() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo");
        let scripts = temp.path().join("build/scripts");
        fs::create_dir_all(&repo).unwrap();
        fs::create_dir_all(&scripts).unwrap();
        fs::write(repo.join("js-20.1.0.jar"), b"js").unwrap();
        fs::write(repo.join("compiler-20.1.0.jar"), b"c").unwrap();
        fs::write(repo.join("app.jar"), b"app").unwrap();
        fs::write(scripts.join("app"), b"#!/bin/sh").unwrap();

        let install_dir = temp.path().join("build/install/app");
        let spec = DistributionSpec::new("main", &install_dir)
            .with_content(DistContent::RuntimeLibs)
            .with_content(DistContent::ProjectArchive)
            .with_content(DistContent::Scripts(scripts.clone()))
            .with_content(DistContent::Compiler);
        let inputs = DistributionInputs {
            runtime_libs: vec![repo.join("js-20.1.0.jar")],
            project_archive: Some(repo.join("app.jar")),
            compiler_files: vec![repo.join("compiler-20.1.0.jar")],
        };

        install(&spec, &inputs).unwrap();
        assert!(install_dir.join("lib/js-20.1.0.jar").is_file());
        assert!(install_dir.join("lib/app.jar").is_file());
        assert!(install_dir.join("bin/app").is_file());
        assert!(install_dir.join("graalCompiler/compiler-20.1.0.jar").is_file());

        let again = install(&spec, &inputs).unwrap();
        assert!(again.is_up_to_date());
    }

    #[test]
    fn test_install_removes_stale_files() {
        let temp = TempDir::new().unwrap();
        let install_dir = temp.path().join("install");
        fs::create_dir_all(install_dir.join("lib")).unwrap();
        fs::write(install_dir.join("lib/old.jar"), b"old").unwrap();

        let spec =
            DistributionSpec::new("main", &install_dir).with_content(DistContent::RuntimeLibs);
        install(&spec, &DistributionInputs::default()).unwrap();
        assert!(!install_dir.join("lib/old.jar").exists());
    }
}
