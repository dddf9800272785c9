//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{ProjectConfig, RepositoryConfig};
use crate::{ConfigError, ConfigResult, GRAAL_VERSION_PROPERTY, PROJECT_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the `graalVersion` property
pub const ENV_GRAAL_VERSION: &str = "TRUFFLE_GRAAL_VERSION";

/// Environment variable overriding the repository path
pub const ENV_REPOSITORY: &str = "TRUFFLE_REPOSITORY";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.truffle/config.toml) - lowest priority
/// 2. Project config (./truffle.toml) - overrides global
/// 3. Environment variables (TRUFFLE_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where truffle.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.truffle/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find truffle.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        let global_config = self.load_global_config().unwrap_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config) or error if not found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE_NAME);

            if config_path.exists() {
                tracing::debug!("Using project configuration {}", config_path.display());
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.truffle/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(version) = env::var(ENV_GRAAL_VERSION) {
            if version.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_GRAAL_VERSION.to_string(),
                    reason: "version cannot be empty".to_string(),
                });
            }
            config
                .properties
                .insert(GRAAL_VERSION_PROPERTY.to_string(), version);
        }

        if let Ok(repository) = env::var(ENV_REPOSITORY) {
            config.repository = Some(RepositoryConfig {
                path: PathBuf::from(repository),
            });
        }

        Ok(config)
    }

    /// Get the global configuration directory (~/.truffle)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".truffle"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Look up a property (project > global)
    pub fn property(&self, name: &str) -> Option<&str> {
        self.project
            .property(name)
            .or_else(|| self.global.properties.get(name).map(String::as_str))
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Get the project name, falling back to the root directory name
    pub fn project_name(&self) -> Option<String> {
        self.project.project_name().map(str::to_string).or_else(|| {
            self.project_root
                .as_ref()
                .and_then(|root| root.file_name())
                .map(|name| name.to_string_lossy().into_owned())
        })
    }

    /// Get the effective build directory (absolute when a project root is known)
    pub fn build_dir(&self) -> PathBuf {
        let relative = self
            .project
            .project
            .as_ref()
            .and_then(|p| p.build_dir.clone())
            .unwrap_or_else(|| PathBuf::from("build"));
        match &self.project_root {
            Some(root) if relative.is_relative() => root.join(relative),
            _ => relative,
        }
    }

    /// Get the effective repository (project > global > ~/.m2/repository)
    pub fn repository_path(&self) -> Option<PathBuf> {
        self.project
            .repository
            .as_ref()
            .or(self.global.repository.as_ref())
            .map(|r| r.path.clone())
            .or_else(GlobalConfig::default_repository)
    }

    /// Check if this is a project (has truffle.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn loader_without_global(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.path().join("no-global.toml"))
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "test-project"
"#,
        );

        let mut loader = loader_without_global(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.project_name().as_deref(), Some("test-project"));
        assert!(config.is_project());
        assert_eq!(config.build_dir(), temp_dir.path().join("build"));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "parent-project"
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = loader_without_global(&temp_dir);
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.project_name().as_deref(), Some("parent-project"));
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_global_properties_are_overridden_by_project() {
        let temp_dir = TempDir::new().unwrap();
        let global_path = temp_dir.path().join("global.toml");
        fs::write(
            &global_path,
            r#"
[properties]
graalVersion = "20.0.0"
other = "global"
"#,
        )
        .unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "p"

[properties]
graalVersion = "20.2.0"
"#,
        );

        let mut loader = ConfigLoader::new().with_global_config_path(&global_path);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.property("graalVersion"), Some("20.2.0"));
        assert_eq!(config.property("other"), Some("global"));
    }

    #[test]
    #[serial]
    fn test_env_override_graal_version() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "p"

[properties]
graalVersion = "20.1.0"
"#,
        );

        env::set_var(ENV_GRAAL_VERSION, "21.0.0");

        let mut loader = loader_without_global(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        env::remove_var(ENV_GRAAL_VERSION);

        assert_eq!(config.property(GRAAL_VERSION_PROPERTY), Some("21.0.0"));
    }

    #[test]
    #[serial]
    fn test_env_override_repository() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[project]\nname = \"p\"\n");

        env::set_var(ENV_REPOSITORY, "/tmp/repo");

        let mut loader = loader_without_global(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        env::remove_var(ENV_REPOSITORY);

        assert_eq!(config.repository_path(), Some(PathBuf::from("/tmp/repo")));
    }

    #[test]
    fn test_custom_build_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "p"
build-dir = "out"
"#,
        );

        let mut loader = loader_without_global(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(config.build_dir(), temp_dir.path().join("out"));
    }
}
