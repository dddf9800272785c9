//! Runtime environment probes
//!
//! The build never inspects the host directly; it asks a [`RuntimeProbe`].
//! [`SystemProbe`] reads the JDK `release` file and looks for tools on disk,
//! [`FixedProbe`] answers with preset values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

/// Minimum Java feature release with a usable compiler interface
pub const MIN_JVMCI_JAVA_VERSION: u32 = 11;

/// What the target runtime can do with Truffle languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeCapability {
    /// GraalVM: the compiler is already part of the runtime
    BuiltInCompiler,
    /// A JVMCI-capable JDK: the compiler can be loaded as a module
    JitCapable,
    /// No compiler interface: languages run in the interpreter only
    Interpreted,
}

impl RuntimeCapability {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BuiltInCompiler => "built-in-compiler",
            Self::JitCapable => "jit-capable",
            Self::Interpreted => "interpreted",
        }
    }
}

/// Questions the build asks about the environment
pub trait RuntimeProbe {
    /// Capability of the runtime that executes tasks
    fn capability(&self) -> RuntimeCapability;

    /// Whether the host is Windows
    fn is_windows(&self) -> bool;

    /// Path to the `native-image` executable, if installed
    fn native_image_tool(&self) -> Option<PathBuf>;
}

/// Probe of the real host, driven by `JAVA_HOME` and `GRAALVM_HOME`
#[derive(Debug, Clone, Default)]
pub struct SystemProbe {
    java_home: Option<PathBuf>,
    graalvm_home: Option<PathBuf>,
}

impl SystemProbe {
    /// Create a probe from the process environment
    pub fn from_env() -> Self {
        Self {
            java_home: env::var_os("JAVA_HOME").map(PathBuf::from),
            graalvm_home: env::var_os("GRAALVM_HOME").map(PathBuf::from),
        }
    }

    pub fn with_java_home(mut self, java_home: impl Into<PathBuf>) -> Self {
        self.java_home = Some(java_home.into());
        self
    }

    pub fn with_graalvm_home(mut self, graalvm_home: impl Into<PathBuf>) -> Self {
        self.graalvm_home = Some(graalvm_home.into());
        self
    }

    fn release(&self) -> HashMap<String, String> {
        self.java_home
            .as_deref()
            .and_then(|home| std::fs::read_to_string(home.join("release")).ok())
            .map(|content| parse_release(&content))
            .unwrap_or_default()
    }
}

impl RuntimeProbe for SystemProbe {
    fn capability(&self) -> RuntimeCapability {
        let release = self.release();
        let capability = capability_from_release(&release);
        tracing::debug!("Detected runtime capability: {}", capability.name());
        capability
    }

    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn native_image_tool(&self) -> Option<PathBuf> {
        let executable = if self.is_windows() {
            "native-image.cmd"
        } else {
            "native-image"
        };
        [self.graalvm_home.as_deref(), self.java_home.as_deref()]
            .into_iter()
            .flatten()
            .map(|home| home.join("bin").join(executable))
            .find(|candidate| candidate.is_file())
    }
}

/// Parse a JDK `release` file (`KEY="value"` lines)
pub fn parse_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            )
        })
        .collect()
}

/// Classify a runtime from its `release` properties
pub fn capability_from_release(release: &HashMap<String, String>) -> RuntimeCapability {
    let is_graal = release.contains_key("GRAALVM_VERSION")
        || release
            .get("IMPLEMENTOR")
            .is_some_and(|vendor| vendor.contains("GraalVM"));
    if is_graal {
        return RuntimeCapability::BuiltInCompiler;
    }

    match release.get("JAVA_VERSION").and_then(|v| java_feature_version(v)) {
        Some(version) if version >= MIN_JVMCI_JAVA_VERSION => RuntimeCapability::JitCapable,
        _ => RuntimeCapability::Interpreted,
    }
}

/// Feature release of a Java version string (`1.8.0_252` is 8, `11.0.7` is 11)
fn java_feature_version(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| c == '.' || c == '_' || c == '-');
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

/// Probe with preset answers
#[derive(Debug, Clone)]
pub struct FixedProbe {
    capability: RuntimeCapability,
    windows: bool,
    native_image: Option<PathBuf>,
}

impl FixedProbe {
    pub fn new(capability: RuntimeCapability) -> Self {
        Self {
            capability,
            windows: false,
            native_image: None,
        }
    }

    pub fn with_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_native_image(mut self, tool: impl AsRef<Path>) -> Self {
        self.native_image = Some(tool.as_ref().to_path_buf());
        self
    }
}

impl RuntimeProbe for FixedProbe {
    fn capability(&self) -> RuntimeCapability {
        self.capability
    }

    fn is_windows(&self) -> bool {
        self.windows
    }

    fn native_image_tool(&self) -> Option<PathBuf> {
        self.native_image.clone()
    }
}
