/// Non-fatal build degradations
use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition the user should know about that does not fail the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    /// No Graal version was configured; the default is used
    DefaultGraalVersion { version: String },
    /// The runtime has no compiler interface; languages run interpreted
    InterpreterOnly { task: String },
}

impl Warning {
    /// Log the warning through `tracing`
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultGraalVersion { version } => write!(
                f,
                "Graal version not set. Defaulting to {}. Set it with `version` in the [graal] \
                 section of truffle.toml or with the `graalVersion` property.",
                version
            ),
            Self::InterpreterOnly { task } => write!(
                f,
                "{}: support for JVM Compiler Interface not detected. Truffle languages \
                 running in interpreter mode only.",
                task
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_version_message_names_remedy() {
        let message = Warning::DefaultGraalVersion {
            version: "20.1.0".to_string(),
        }
        .to_string();
        assert!(message.contains("20.1.0"));
        assert!(message.contains("[graal]"));
        assert!(message.contains("graalVersion"));
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&Warning::InterpreterOnly {
            task: "run".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"interpreter-only","task":"run"}"#);
    }
}
