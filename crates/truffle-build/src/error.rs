/// Build wiring error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration '{child}' cannot extend '{parent}': would create the cycle {cycle}")]
    Cycle {
        child: String,
        parent: String,
        cycle: String,
    },

    #[error("Circular task dependency detected: {0}")]
    TaskCycle(String),

    #[error("Configuration '{name}' cannot be resolved: {reason}")]
    Unresolvable { name: String, reason: String },

    #[error(
        "Configuration '{name}' was resolved before dependency declarations closed; \
         resolve it from a task action or after Project::close()"
    )]
    PrematureResolution { name: String },

    #[error(
        "Configuration '{name}' can no longer be changed: declarations closed; \
         declare dependencies before Project::close()"
    )]
    ConfigurationClosed { name: String },

    #[error("Configuration not found: {name}")]
    ConfigurationNotFound { name: String },

    #[error("Configuration already exists: {name}")]
    DuplicateConfiguration { name: String },

    #[error(
        "Task '{task}' requires a language id; set `language-id` in the [graal] section of truffle.toml"
    )]
    MissingIdentity { task: String },

    #[error("Task '{task}' cannot run here: {reason}")]
    UnsupportedEnvironment { task: String, reason: String },

    #[error(
        "Native image task '{task}' has no entry point; set either `main-class` or `jar`"
    )]
    MissingEntryPoint { task: String },

    #[error("Task not found: {task}")]
    TaskNotFound { task: String },

    #[error("Task already exists: {task}")]
    DuplicateTask { task: String },

    #[error("Task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("Invalid dependency '{0}': expected 'group:name:version'")]
    InvalidCoordinate(String),

    #[error("Archive error at {path}: {error}")]
    Archive { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] truffle_config::ConfigError),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an unresolvable-configuration error
    pub fn unresolvable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unresolvable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration not found error
    pub fn configuration_not_found(name: impl Into<String>) -> Self {
        Self::ConfigurationNotFound { name: name.into() }
    }

    /// Create a task not found error
    pub fn task_not_found(task: impl Into<String>) -> Self {
        Self::TaskNotFound { task: task.into() }
    }

    /// Create an archive error with path context
    pub fn archive(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            error: error.to_string(),
        }
    }
}
