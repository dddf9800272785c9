//! Artifact resolution
//!
//! Turning a module coordinate into files is the job of the host build
//! engine; the [`ArtifactResolver`] trait is the seam. [`LocalRepository`]
//! reads a maven-layout directory, [`StaticResolver`] is an in-memory table.

use crate::configuration::Coordinate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sidecar extension listing a module's own dependencies
pub const DEPS_EXTENSION: &str = "deps";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("artifact {coordinate} not found (looked for {path})")]
    ArtifactNotFound { coordinate: String, path: PathBuf },

    #[error("artifact {0} is not known to the resolver")]
    UnknownArtifact(String),

    #[error("invalid dependency '{line}' in {path}")]
    InvalidMetadata { path: PathBuf, line: String },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// Maps a module coordinate to the files it contributes
pub trait ArtifactResolver {
    /// The module's files followed by those of its dependencies
    fn resolve(&self, coordinate: &Coordinate) -> Result<Vec<PathBuf>, ResolveError>;
}

/// Resolver over a maven-layout directory
///
/// `group:name:version` lives at
/// `<root>/<group as path>/<name>/<version>/<name>-<version>.jar`. An optional
/// `<name>-<version>.deps` file next to it lists further coordinates, one per
/// line; blank lines and `#` comments are ignored.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a module's files
    pub fn module_dir(&self, coordinate: &Coordinate) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in coordinate.group.split('.') {
            dir.push(segment);
        }
        dir.join(&coordinate.name).join(&coordinate.version)
    }

    /// Location of a module's jar
    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.module_dir(coordinate).join(coordinate.file_name())
    }

    fn deps_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.module_dir(coordinate).join(format!(
            "{}-{}.{}",
            coordinate.name, coordinate.version, DEPS_EXTENSION
        ))
    }

    fn read_deps(&self, coordinate: &Coordinate) -> Result<Vec<Coordinate>, ResolveError> {
        let path = self.deps_path(coordinate);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|error| ResolveError::Io {
            path: path.clone(),
            error,
        })?;

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                Coordinate::parse(line).map_err(|_| ResolveError::InvalidMetadata {
                    path: path.clone(),
                    line: line.to_string(),
                })
            })
            .collect()
    }
}

impl ArtifactResolver for LocalRepository {
    fn resolve(&self, coordinate: &Coordinate) -> Result<Vec<PathBuf>, ResolveError> {
        let mut files = Vec::new();
        let mut visited = Vec::new();
        let mut pending = vec![coordinate.clone()];

        // Depth-first, the requested module first.
        while let Some(current) = pending.pop() {
            if visited.contains(&current) {
                continue;
            }
            let jar = self.artifact_path(&current);
            if !jar.is_file() {
                return Err(ResolveError::ArtifactNotFound {
                    coordinate: current.to_string(),
                    path: jar,
                });
            }
            files.push(jar);
            let deps = self.read_deps(&current)?;
            pending.extend(deps.into_iter().rev());
            visited.push(current);
        }

        tracing::debug!("Resolved {} to {} files", coordinate, files.len());
        Ok(files)
    }
}

/// In-memory resolver keyed by coordinate string
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    artifacts: HashMap<String, Vec<PathBuf>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the files for a coordinate
    pub fn with_artifact<I, P>(mut self, coordinate: &str, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.artifacts
            .insert(coordinate.to_string(), files.into_iter().map(Into::into).collect());
        self
    }
}

impl ArtifactResolver for StaticResolver {
    fn resolve(&self, coordinate: &Coordinate) -> Result<Vec<PathBuf>, ResolveError> {
        self.artifacts
            .get(&coordinate.to_string())
            .cloned()
            .ok_or_else(|| ResolveError::UnknownArtifact(coordinate.to_string()))
    }
}
