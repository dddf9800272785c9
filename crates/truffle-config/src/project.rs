//! Project Configuration (truffle.toml)
//!
//! Handles project-level configuration stored in `truffle.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration from truffle.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata and applied plugins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSection>,

    /// Graal compiler and language component settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graal: Option<GraalConfig>,

    /// Free-form project properties (e.g. `graalVersion`)
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    /// Application entry point, enables `run`, `startScripts` and `distNative`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationConfig>,

    /// Dependencies keyed by configuration name (`language`, `implementation`, ...)
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Vec<DependencySpec>>,

    /// Local artifact repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,

    /// Additional native image targets
    #[serde(default, rename = "native-image")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub native_images: Vec<NativeImageConfig>,
}

/// `[project]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectSection {
    /// Project name, also the default language name
    pub name: String,

    /// Build output root (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Applied plugins
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
}

/// Plugins a project may apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Plugin {
    /// Graal compiler wiring and language configurations
    Compiler,
    /// Truffle language (component) build; implies `Compiler`
    Language,
    /// Native image targets
    NativeImage,
    /// Runnable application with start scripts and a distribution
    Application,
}

impl Plugin {
    /// Get plugin name as written in truffle.toml
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compiler => "compiler",
            Self::Language => "language",
            Self::NativeImage => "native-image",
            Self::Application => "application",
        }
    }
}

/// `[graal]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GraalConfig {
    /// Requested Graal compiler version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Identifier of the language defined by this project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,

    /// Display name of the language (default: project name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,

    /// Component archive output directory (default: build/graalComponent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Prepared compiler directory (default: build/graalCompiler)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_dir: Option<PathBuf>,
}

/// `[application]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ApplicationConfig {
    /// Application name (default: project name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fully qualified main class
    pub main_class: String,

    /// Default JVM arguments for `run` and the start scripts
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub jvm_args: Vec<String>,
}

/// A single dependency declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DependencySpec {
    /// Module coordinate (`group:name:version`)
    Coordinate(String),

    /// Local files, relative to the project root
    Files {
        /// File paths
        files: Vec<PathBuf>,
    },
}

/// `[repository]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Root of a maven-layout artifact directory
    pub path: PathBuf,
}

/// `[[native-image]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct NativeImageConfig {
    /// Task name
    pub name: String,

    /// Build the image for this main class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,

    /// Build the image from this jar (relative to the project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jar: Option<PathBuf>,

    /// Executable name (default: task name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,

    /// Output directory (default: build/nativeImage)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Extra arguments passed to native-image
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(project) = &self.project {
            if project.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
        }

        if let Some(graal) = &self.graal {
            if let Some(version) = &graal.version {
                if version.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "graal.version".to_string(),
                        reason: "version cannot be empty; remove the key to use the default"
                            .to_string(),
                    });
                }
            }
            if let Some(id) = &graal.language_id {
                if !is_valid_language_id(id) {
                    return Err(ConfigError::InvalidValue {
                        field: "graal.language-id".to_string(),
                        reason: format!(
                            "'{}' must be non-empty and contain only letters, digits, '-' or '_'",
                            id
                        ),
                    });
                }
            }
        }

        if let Some(app) = &self.application {
            if app.main_class.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "application.main-class".to_string(),
                    reason: "main class cannot be empty".to_string(),
                });
            }
        }

        for (configuration, specs) in &self.dependencies {
            for spec in specs {
                validate_dependency(configuration, spec)?;
            }
        }

        for image in &self.native_images {
            if image.main_class.is_some() && image.jar.is_some() {
                return Err(ConfigError::InvalidValue {
                    field: format!("native-image.{}", image.name),
                    reason: "set either main-class or jar, not both".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the project name, if present
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Get the applied plugins
    pub fn plugins(&self) -> &[Plugin] {
        self.project
            .as_ref()
            .map(|p| p.plugins.as_slice())
            .unwrap_or(&[])
    }

    /// Check whether a plugin is applied
    pub fn has_plugin(&self, plugin: Plugin) -> bool {
        self.plugins().contains(&plugin)
    }

    /// Look up a project property
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.project.is_some() {
            self.project = other.project.clone();
        }
        if other.graal.is_some() {
            self.graal = other.graal.clone();
        }
        if other.application.is_some() {
            self.application = other.application.clone();
        }
        if other.repository.is_some() {
            self.repository = other.repository.clone();
        }
        self.properties.extend(other.properties.clone());
        for (configuration, specs) in &other.dependencies {
            self.dependencies
                .entry(configuration.clone())
                .or_default()
                .extend(specs.iter().cloned());
        }
        self.native_images.extend(other.native_images.iter().cloned());
    }
}

/// Split a `group:name:version` coordinate
pub fn parse_coordinate(coordinate: &str) -> Option<(&str, &str, &str)> {
    let mut parts = coordinate.split(':');
    let group = parts.next()?;
    let name = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() || group.is_empty() || name.is_empty() || version.is_empty() {
        return None;
    }
    Some((group, name, version))
}

fn is_valid_language_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a dependency specification
fn validate_dependency(configuration: &str, spec: &DependencySpec) -> ConfigResult<()> {
    match spec {
        DependencySpec::Coordinate(coordinate) => {
            if parse_coordinate(coordinate).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: format!("dependencies.{}", configuration),
                    reason: format!(
                        "'{}' is not a 'group:name:version' coordinate",
                        coordinate
                    ),
                });
            }
        }
        DependencySpec::Files { files } => {
            if files.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("dependencies.{}", configuration),
                    reason: "files list cannot be empty".to_string(),
                });
            }
        }
    }
    Ok(())
}
