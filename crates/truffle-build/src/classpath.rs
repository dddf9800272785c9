//! Classpath composition
//!
//! The dynamic-load classpath of a target has two projections over the same
//! logical file set: `Live` points at the files where the build left them,
//! `Archived` points at where a distribution places them
//! (`<install-root>/lib/<file-name>`).

use crate::configuration::{ConfigurationGraph, ConfigurationRole};
use crate::error::{BuildError, BuildResult};
use crate::resolver::ArtifactResolver;
use crate::script::HOME_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Directory of a distribution holding the classpath files
pub const LIB_DIR: &str = "lib";

/// Classpath projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClasspathMode {
    /// Absolute paths of the build's own files
    Live,
    /// Paths inside an installed distribution
    Archived,
}

/// One classpath element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathEntry {
    /// The file or directory produced by resolution or the build
    pub source: PathBuf,
    /// Where the target sees it
    pub path: PathBuf,
}

/// An ordered, duplicate-free classpath
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classpath {
    pub mode: ClasspathMode,
    pub entries: Vec<ClasspathEntry>,
}

impl Classpath {
    /// Projected paths in order
    pub fn paths(&self) -> Vec<&Path> {
        self.entries.iter().map(|e| e.path.as_path()).collect()
    }

    /// Source files in order
    pub fn sources(&self) -> Vec<&Path> {
        self.entries.iter().map(|e| e.source.as_path()).collect()
    }

    /// Base names of the projected paths
    pub fn file_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    /// Join the projected paths with a separator
    pub fn join(&self, separator: &str) -> String {
        self.entries
            .iter()
            .map(|e| e.path.display().to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outputs of the project itself that join a component classpath
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectOutputs {
    /// The project archive (jar)
    pub archive: PathBuf,
    /// Compiled class and resource directories
    pub output_dirs: Vec<PathBuf>,
}

/// Computes the dynamic-load classpath of a target
pub struct ClasspathComposer<'a> {
    graph: &'a ConfigurationGraph,
    resolver: &'a dyn ArtifactResolver,
    /// Present for component (language) builds
    component: Option<ProjectOutputs>,
    /// Root against which relative files are made absolute
    base_dir: PathBuf,
    /// Root of the `Archived` projection
    install_root: PathBuf,
}

impl<'a> ClasspathComposer<'a> {
    pub fn new(graph: &'a ConfigurationGraph, resolver: &'a dyn ArtifactResolver) -> Self {
        Self {
            graph,
            resolver,
            component: None,
            base_dir: PathBuf::new(),
            install_root: PathBuf::from(HOME_PLACEHOLDER),
        }
    }

    /// Compose for a component build with the given project outputs
    pub fn with_component(mut self, outputs: ProjectOutputs) -> Self {
        self.component = Some(outputs);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Root of the `Archived` projection (default: the home placeholder)
    pub fn with_install_root(mut self, install_root: impl Into<PathBuf>) -> Self {
        self.install_root = install_root.into();
        self
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    /// Compute the classpath in the given mode
    pub fn compose(&self, mode: ClasspathMode) -> BuildResult<Classpath> {
        let truffle = ConfigurationRole::TruffleClasspath.name();
        if self.graph.get(truffle).is_none() {
            return Err(BuildError::unresolvable(
                truffle,
                "apply the compiler plugin to declare it",
            ));
        }
        let mut files = self.graph.resolve(truffle, self.resolver)?;

        if let Some(outputs) = &self.component {
            let runtime = ConfigurationRole::RuntimeClasspath.name();
            let parents = self
                .graph
                .get(runtime)
                .ok_or_else(|| BuildError::configuration_not_found(runtime))?
                .extends_from();

            for parent in parents {
                let installed = self
                    .graph
                    .get(parent)
                    .and_then(|c| c.role())
                    .is_some_and(|role| role == ConfigurationRole::InstalledLanguage);
                if installed {
                    tracing::debug!("Skipping '{}' on the dynamic-load classpath", parent);
                    continue;
                }
                files.extend(self.graph.resolve_detached(parent, self.resolver)?);
            }

            match mode {
                ClasspathMode::Archived => files.push(outputs.archive.clone()),
                ClasspathMode::Live => files.extend(outputs.output_dirs.iter().cloned()),
            }
        }

        let mut seen = HashSet::new();
        let entries = files
            .into_iter()
            .map(|file| self.absolute(file))
            .filter(|file| seen.insert(file.clone()))
            .map(|source| {
                let path = self.project(&source, mode);
                ClasspathEntry { source, path }
            })
            .collect();

        Ok(Classpath { mode, entries })
    }

    fn absolute(&self, file: PathBuf) -> PathBuf {
        if file.is_absolute() {
            file
        } else {
            self.base_dir.join(file)
        }
    }

    fn project(&self, source: &Path, mode: ClasspathMode) -> PathBuf {
        match (mode, source.file_name()) {
            (ClasspathMode::Archived, Some(name)) => self.install_root.join(LIB_DIR).join(name),
            _ => source.to_path_buf(),
        }
    }
}
