//! Truffle Configuration System
//!
//! Provides configuration management for Graal/Truffle projects including:
//! - Project configuration (truffle.toml)
//! - Global user configuration (~/.truffle/config.toml)
//! - Project properties (e.g. `graalVersion`)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.truffle/config.toml)
//! 2. Project config (./truffle.toml)
//! 3. Environment variables (TRUFFLE_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use truffle_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project configuration file
pub const PROJECT_FILE_NAME: &str = "truffle.toml";

/// Project property consulted when `[graal] version` is not set
pub const GRAAL_VERSION_PROPERTY: &str = "graalVersion";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{
    ApplicationConfig, GraalConfig, NativeImageConfig, Plugin, ProjectConfig, ProjectSection,
    RepositoryConfig,
};
