//! Native executables through the GraalVM `native-image` tool

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default output directory under the build directory
pub const NATIVE_IMAGE_DIR: &str = "nativeImage";

/// What the image is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPoint {
    /// A main class on the project's runtime classpath
    MainClass(String),
    /// An executable jar
    Jar(PathBuf),
}

/// Native image build settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeImageSpec {
    /// Main class or jar; setting one replaces the other
    pub entry: Option<EntryPoint>,
    /// Executable name (default: task name)
    pub output_name: Option<String>,
    /// Output directory (default: `<build>/nativeImage`)
    pub output_dir: Option<PathBuf>,
    /// Extra `native-image` arguments
    pub args: Vec<String>,
}

impl NativeImageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_main_class(mut self, main_class: impl Into<String>) -> Self {
        self.set_main_class(main_class);
        self
    }

    pub fn for_jar(mut self, jar: impl Into<PathBuf>) -> Self {
        self.set_jar(jar);
        self
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn set_main_class(&mut self, main_class: impl Into<String>) {
        self.entry = Some(EntryPoint::MainClass(main_class.into()));
    }

    pub fn set_jar(&mut self, jar: impl Into<PathBuf>) {
        self.entry = Some(EntryPoint::Jar(jar.into()));
    }

    /// Uses the runtime classpath (main class builds only)
    pub fn needs_classpath(&self) -> bool {
        matches!(self.entry, Some(EntryPoint::MainClass(_)))
    }
}

/// A native image task ready to run
#[derive(Debug, Clone)]
pub struct NativeImageTask<'a> {
    name: &'a str,
    spec: &'a NativeImageSpec,
    output_dir: PathBuf,
}

impl<'a> NativeImageTask<'a> {
    /// Bind a spec to its task name and the build directory
    pub fn new(name: &'a str, spec: &'a NativeImageSpec, build_dir: &Path) -> Self {
        let output_dir = spec
            .output_dir
            .clone()
            .unwrap_or_else(|| build_dir.join(NATIVE_IMAGE_DIR));
        Self {
            name,
            spec,
            output_dir,
        }
    }

    pub fn output_name(&self) -> &str {
        self.spec.output_name.as_deref().unwrap_or(self.name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The executable produced by the task
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(self.output_name())
    }

    /// Arguments passed to `native-image`
    pub fn arguments(&self, classpath: &[PathBuf], separator: &str) -> BuildResult<Vec<String>> {
        let mut args = Vec::new();
        match &self.spec.entry {
            Some(EntryPoint::MainClass(main_class)) => {
                if !classpath.is_empty() {
                    let joined: Vec<_> =
                        classpath.iter().map(|p| p.display().to_string()).collect();
                    args.push("-cp".to_string());
                    args.push(joined.join(separator));
                }
                args.push(main_class.clone());
            }
            Some(EntryPoint::Jar(jar)) => {
                args.push("-jar".to_string());
                args.push(jar.display().to_string());
            }
            None => {
                return Err(BuildError::MissingEntryPoint {
                    task: self.name.to_string(),
                })
            }
        }
        args.push(format!("-H:Name={}", self.output_name()));
        args.push(format!("-H:Path={}", self.output_dir.display()));
        args.extend(self.spec.args.iter().cloned());
        Ok(args)
    }

    /// Run `native-image`; returns the produced executable
    pub fn run(
        &self,
        tool: Option<PathBuf>,
        classpath: &[PathBuf],
        separator: &str,
    ) -> BuildResult<PathBuf> {
        let args = self.arguments(classpath, separator)?;
        let tool = tool.ok_or_else(|| BuildError::UnsupportedEnvironment {
            task: self.name.to_string(),
            reason: "the native-image tool was not found; install it with \
                     `gu install native-image` \
                     and point GRAALVM_HOME or JAVA_HOME at the GraalVM installation"
                .to_string(),
        })?;

        fs::create_dir_all(&self.output_dir).map_err(|e| BuildError::io(&self.output_dir, e))?;

        tracing::debug!("Running {} {}", tool.display(), args.join(" "));
        let output = Command::new(&tool)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| BuildError::io(&tool, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::TaskFailed {
                task: self.name.to_string(),
                reason: format!(
                    "native-image exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(self.output_file())
    }
}
