//! Launcher script patching
//!
//! Start scripts are patched in two passes. Before generation, each
//! [`FlagAugmenter`] appends to the default JVM options, writing the
//! distribution root as [`HOME_PLACEHOLDER`]. After generation the
//! placeholders are replaced in every script with the platform's own syntax.
//! Both passes may run any number of times.

use crate::classpath::{Classpath, LIB_DIR};
use crate::error::{BuildError, BuildResult};
use crate::launcher::{ScriptGenerator, StartScripts};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Distribution root in generated options
pub const HOME_PLACEHOLDER: &str = "<HOME>";

/// Path list separator in generated options
pub const PATHSEP_PLACEHOLDER: &str = "<PATHSEP>";

/// System property read by Truffle for dynamically loaded languages
pub const TRUFFLE_CLASS_PATH_PROPERTY: &str = "truffle.class.path.append";

/// Directory of a distribution holding the compiler
pub const COMPILER_DIR_NAME: &str = "graalCompiler";

/// Script platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::Windows => "windows",
        }
    }

    /// How the script refers to its installation root
    pub fn home_variable(&self) -> &'static str {
        match self {
            Self::Unix => "$APP_HOME",
            Self::Windows => "%APP_HOME%",
        }
    }

    pub fn path_separator(&self) -> &'static str {
        match self {
            Self::Unix => ":",
            Self::Windows => ";",
        }
    }

    /// Replace the placeholders with this platform's syntax
    pub fn substitute(&self, content: &str) -> String {
        content
            .replace(HOME_PLACEHOLDER, self.home_variable())
            .replace(PATHSEP_PLACEHOLDER, self.path_separator())
    }

    pub fn all() -> [Platform; 2] {
        [Self::Unix, Self::Windows]
    }
}

/// JVMCI flags loading the compiler from `compiler_dir`
pub fn jvmci_flags(compiler_dir: &str) -> Vec<String> {
    vec![
        "-XX:+UnlockExperimentalVMOptions".to_string(),
        "-XX:+EnableJVMCI".to_string(),
        format!("--module-path={}", compiler_dir),
        format!("--upgrade-module-path={}", compiler_dir),
    ]
}

/// The `-Dtruffle.class.path.append=` option for a joined path list
pub fn class_path_append_flag(value: &str) -> String {
    format!("-D{}={}", TRUFFLE_CLASS_PATH_PROPERTY, value)
}

/// A transform over a script's default JVM options
pub trait FlagAugmenter {
    fn name(&self) -> &'static str;

    /// Add this augmenter's flags; applying twice must equal applying once
    fn augment(&self, options: &mut Vec<String>);
}

/// Flags enabling the compiler shipped in the distribution
#[derive(Debug, Clone, Copy, Default)]
pub struct CompilerFlags;

impl CompilerFlags {
    pub fn flags() -> Vec<String> {
        let compiler_dir = format!("{}/{}/", HOME_PLACEHOLDER, COMPILER_DIR_NAME);
        let mut flags = vec!["-XX:+IgnoreUnrecognizedVMOptions".to_string()];
        flags.extend(jvmci_flags(&compiler_dir));
        flags
    }
}

impl FlagAugmenter for CompilerFlags {
    fn name(&self) -> &'static str {
        "compiler"
    }

    fn augment(&self, options: &mut Vec<String>) {
        for flag in Self::flags() {
            if !options.contains(&flag) {
                options.push(flag);
            }
        }
    }
}

/// Dynamic-load classpath of a component build
#[derive(Debug, Clone)]
pub struct DynamicLanguageFlags {
    file_names: Vec<String>,
}

impl DynamicLanguageFlags {
    /// Build from the file names of an archived classpath
    pub fn new<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file_names: file_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_classpath(classpath: &Classpath) -> Self {
        Self::new(classpath.file_names())
    }

    /// `-Dtruffle.class.path.append=<HOME>/lib/a.jar<PATHSEP><HOME>/lib/b.jar`
    pub fn flag(&self) -> String {
        let entries: Vec<_> = self
            .file_names
            .iter()
            .map(|name| format!("{}/{}/{}", HOME_PLACEHOLDER, LIB_DIR, name))
            .collect();
        class_path_append_flag(&entries.join(PATHSEP_PLACEHOLDER))
    }
}

impl FlagAugmenter for DynamicLanguageFlags {
    fn name(&self) -> &'static str {
        "dynamic-languages"
    }

    fn augment(&self, options: &mut Vec<String>) {
        let prefix = class_path_append_flag("");
        let flag = self.flag();
        match options.iter_mut().find(|o| o.starts_with(&prefix)) {
            Some(existing) => *existing = flag,
            None => options.push(flag),
        }
    }
}

/// Outcome of a patch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchReport {
    /// Scripts whose placeholders were replaced
    pub patched: Vec<PathBuf>,
    /// Scripts already free of placeholders
    pub unchanged: Vec<PathBuf>,
    /// Scripts that were not generated
    pub missing: Vec<PathBuf>,
}

/// Runs the augmenters, the generator and the placeholder substitution
#[derive(Default)]
pub struct ScriptPatcher {
    augmenters: Vec<Box<dyn FlagAugmenter>>,
}

impl ScriptPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an augmenter; augmenters run in insertion order
    pub fn with_augmenter(mut self, augmenter: impl FlagAugmenter + 'static) -> Self {
        self.augmenters.push(Box::new(augmenter));
        self
    }

    /// Patcher for a distribution: compiler flags, then the dynamic-load
    /// classpath when a component classpath is given
    pub fn for_distribution(component: Option<&Classpath>) -> Self {
        let patcher = Self::new().with_augmenter(CompilerFlags);
        match component {
            Some(classpath) => {
                patcher.with_augmenter(DynamicLanguageFlags::from_classpath(classpath))
            }
            None => patcher,
        }
    }

    pub fn augmenter_names(&self) -> Vec<&'static str> {
        self.augmenters.iter().map(|a| a.name()).collect()
    }

    /// Pass 1: extend the default JVM options
    pub fn augment(&self, scripts: &mut StartScripts) {
        for augmenter in &self.augmenters {
            augmenter.augment(&mut scripts.default_jvm_opts);
            tracing::debug!(
                "Applied '{}' flags to start scripts of {}",
                augmenter.name(),
                scripts.application_name
            );
        }
    }

    /// Pass 2: replace the placeholders in every generated script
    pub fn substitute(&self, scripts: &StartScripts) -> BuildResult<PatchReport> {
        let mut report = PatchReport::default();
        for platform in Platform::all() {
            let path = scripts.script(platform);
            if !path.is_file() {
                tracing::debug!("No {} script at {}", platform.name(), path.display());
                report.missing.push(path);
                continue;
            }
            if substitute_file(&path, platform)? {
                report.patched.push(path);
            } else {
                report.unchanged.push(path);
            }
        }
        Ok(report)
    }

    /// Both passes around script generation
    pub fn run(
        &self,
        scripts: &mut StartScripts,
        generator: &dyn ScriptGenerator,
    ) -> BuildResult<PatchReport> {
        self.augment(scripts);
        generator.generate(scripts)?;
        self.substitute(scripts)
    }
}

/// Replace placeholders in one file; returns whether it changed
fn substitute_file(path: &Path, platform: Platform) -> BuildResult<bool> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let patched = platform.substitute(&content);
    if patched == content {
        return Ok(false);
    }
    fs::write(path, patched).map_err(|e| BuildError::io(path, e))?;
    tracing::debug!("Patched {}", path.display());
    Ok(true)
}
