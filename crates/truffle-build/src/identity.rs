//! Graal compiler version and language component identity
//!
//! Settings are created once per project with eager defaults. They may be
//! changed while declarations are open; closing the project freezes them and
//! fixes the compiler version.

use crate::configuration::Coordinate;
use crate::error::{BuildError, BuildResult};
use crate::warning::Warning;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compiler version used when none is configured
pub const DEFAULT_GRAAL_VERSION: &str = "20.1.0";

/// Maven group of the Graal compiler
pub const COMPILER_GROUP: &str = "org.graalvm.compiler";

/// Maven name of the Graal compiler
pub const COMPILER_NAME: &str = "compiler";

/// Where the compiler version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// Set on the settings (`[graal] version`)
    Explicit,
    /// The `graalVersion` property
    Property,
    /// [`DEFAULT_GRAAL_VERSION`]
    Default,
}

/// A compiler version together with its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    pub version: String,
    pub source: VersionSource,
}

/// Graal settings of a project
#[derive(Debug, Clone)]
pub struct GraalSettings {
    /// Explicitly requested version
    version: Option<String>,
    /// Language identifier, required by component builds
    language_id: Option<String>,
    /// Language display name
    language_name: String,
    /// Component archive output directory
    output_dir: PathBuf,
    /// Prepared compiler directory
    compiler_dir: PathBuf,
    /// Version fixed at freeze time
    resolved: Option<ResolvedVersion>,
}

impl GraalSettings {
    /// Create settings with defaults derived from the project
    pub fn new(project_name: impl Into<String>, build_dir: &Path) -> Self {
        Self {
            version: None,
            language_id: None,
            language_name: project_name.into(),
            output_dir: build_dir.join("graalComponent"),
            compiler_dir: build_dir.join("graalCompiler"),
            resolved: None,
        }
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.version = Some(version.into());
        Ok(())
    }

    pub fn set_language_id(&mut self, id: impl Into<String>) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.language_id = Some(id.into());
        Ok(())
    }

    pub fn set_language_name(&mut self, name: impl Into<String>) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.language_name = name.into();
        Ok(())
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.output_dir = dir.into();
        Ok(())
    }

    pub fn set_compiler_dir(&mut self, dir: impl Into<PathBuf>) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.compiler_dir = dir.into();
        Ok(())
    }

    /// Explicitly requested version, if any
    pub fn requested_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Resolve the version: explicit value, then the property, then the default
    pub fn resolve_version(&self, property: Option<&str>) -> ResolvedVersion {
        let explicit = self.version.as_deref().filter(|v| !v.trim().is_empty());
        let property = property.filter(|v| !v.trim().is_empty());

        match (explicit, property) {
            (Some(version), _) => ResolvedVersion {
                version: version.to_string(),
                source: VersionSource::Explicit,
            },
            (None, Some(version)) => ResolvedVersion {
                version: version.to_string(),
                source: VersionSource::Property,
            },
            (None, None) => ResolvedVersion {
                version: DEFAULT_GRAAL_VERSION.to_string(),
                source: VersionSource::Default,
            },
        }
    }

    /// Fix the version and make the settings read-only
    ///
    /// Returns the default-version warning the first time the default is
    /// chosen; freezing again returns nothing.
    pub fn freeze(&mut self, property: Option<&str>) -> Option<Warning> {
        if self.resolved.is_some() {
            return None;
        }
        let resolved = self.resolve_version(property);
        tracing::debug!(
            "Graal version {} ({:?})",
            resolved.version,
            resolved.source
        );
        let warning = match resolved.source {
            VersionSource::Default => Some(Warning::DefaultGraalVersion {
                version: resolved.version.clone(),
            }),
            _ => None,
        };
        self.resolved = Some(resolved);
        warning
    }

    pub fn is_frozen(&self) -> bool {
        self.resolved.is_some()
    }

    /// The resolved version (available once frozen)
    pub fn version(&self) -> Option<&str> {
        self.resolved.as_ref().map(|r| r.version.as_str())
    }

    pub fn resolved_version(&self) -> Option<&ResolvedVersion> {
        self.resolved.as_ref()
    }

    /// Coordinate of the compiler matching the resolved version
    pub fn compiler_coordinate(&self) -> Option<Coordinate> {
        self.version()
            .map(|version| Coordinate::new(COMPILER_GROUP, COMPILER_NAME, version))
    }

    pub fn language_id(&self) -> Option<&str> {
        self.language_id.as_deref()
    }

    /// The language id, or `MissingIdentity` naming the task that needs it
    pub fn require_language_id(&self, task: &str) -> BuildResult<&str> {
        self.language_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BuildError::MissingIdentity {
                task: task.to_string(),
            })
    }

    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compiler_dir(&self) -> &Path {
        &self.compiler_dir
    }

    fn ensure_mutable(&self) -> BuildResult<()> {
        if self.is_frozen() {
            return Err(BuildError::ConfigurationClosed {
                name: "graal".to_string(),
            });
        }
        Ok(())
    }
}
