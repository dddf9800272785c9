/// Build tasks and their specifications
use crate::launcher::StartScripts;
use crate::native_image::NativeImageSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the compiler preparation task
pub const PREPARE_COMPILER_TASK: &str = "prepareCompiler";
/// Name of the component archive task
pub const GRAAL_COMPONENT_TASK: &str = "graalComponent";
/// Name of the application exec task
pub const RUN_TASK: &str = "run";
/// Name of the start script task
pub const START_SCRIPTS_TASK: &str = "startScripts";
/// Name of the distribution install task
pub const INSTALL_DIST_TASK: &str = "installDist";
/// Name of the application native image task
pub const DIST_NATIVE_TASK: &str = "distNative";

/// What a task does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskKind {
    /// Copy the resolved compiler into the compiler directory
    PrepareCompiler,
    /// Fork a JVM
    Exec(ExecSpec),
    /// Generate launcher scripts
    StartScripts(StartScripts),
    /// Assemble an installed distribution
    InstallDist(DistributionSpec),
    /// Build the language component archive
    GraalComponent,
    /// Build a native executable
    NativeImage(NativeImageSpec),
}

impl TaskKind {
    /// Short type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::PrepareCompiler => "prepare-compiler",
            Self::Exec(_) => "exec",
            Self::StartScripts(_) => "start-scripts",
            Self::InstallDist(_) => "install-dist",
            Self::GraalComponent => "graal-component",
            Self::NativeImage(_) => "native-image",
        }
    }
}

/// Actions run around a task's own action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskHook {
    /// Before an exec task: add compiler flags for the runtime capability
    ConfigureRuntime,
    /// Around start script generation: augment options, then substitute placeholders
    PatchScripts,
}

/// A named unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task name
    pub name: String,
    /// Task group shown in listings
    pub group: Option<String>,
    /// Human readable description
    pub description: Option<String>,
    /// Task action
    pub kind: TaskKind,
    /// Tasks that must run first
    pub depends_on: Vec<String>,
    /// Attached hooks
    pub hooks: Vec<TaskHook>,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            group: None,
            description: None,
            kind,
            depends_on: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_dependency(mut self, task: impl Into<String>) -> Self {
        self.depend_on(task);
        self
    }

    /// Add a dependency edge; adding it twice is a no-op
    pub fn depend_on(&mut self, task: impl Into<String>) {
        let task = task.into();
        if !self.depends_on.contains(&task) {
            self.depends_on.push(task);
        }
    }

    /// Attach a hook; attaching it twice is a no-op
    pub fn add_hook(&mut self, hook: TaskHook) {
        if !self.hooks.contains(&hook) {
            self.hooks.push(hook);
        }
    }

    pub fn has_hook(&self, hook: TaskHook) -> bool {
        self.hooks.contains(&hook)
    }
}

/// A forked JVM invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSpec {
    /// The `java` executable
    pub executable: PathBuf,
    /// Fully qualified main class
    pub main_class: String,
    /// Explicit classpath entries
    pub classpath: Vec<PathBuf>,
    /// Prepend the project's runtime classpath at execution time
    pub use_runtime_classpath: bool,
    /// JVM options
    pub jvm_args: Vec<String>,
    /// `-D` system properties
    pub system_properties: BTreeMap<String, String>,
    /// Program arguments
    pub args: Vec<String>,
    /// Working directory (default: project root)
    pub working_dir: Option<PathBuf>,
}

impl ExecSpec {
    pub fn new(main_class: impl Into<String>) -> Self {
        Self {
            executable: default_java(),
            main_class: main_class.into(),
            classpath: Vec::new(),
            use_runtime_classpath: false,
            jvm_args: Vec::new(),
            system_properties: BTreeMap::new(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_runtime_classpath(mut self) -> Self {
        self.use_runtime_classpath = true;
        self
    }

    pub fn with_jvm_args(mut self, args: Vec<String>) -> Self {
        self.jvm_args = args;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Append JVM options that are not present yet
    pub fn add_jvm_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            let arg = arg.into();
            if !self.jvm_args.contains(&arg) {
                self.jvm_args.push(arg);
            }
        }
    }

    pub fn system_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.system_properties.insert(key.into(), value.into());
    }

    /// Full argument list passed to the executable
    pub fn command_line(&self, classpath: &[PathBuf], separator: &str) -> Vec<String> {
        let mut line = self.jvm_args.clone();
        line.extend(
            self.system_properties
                .iter()
                .map(|(key, value)| format!("-D{}={}", key, value)),
        );
        if !classpath.is_empty() {
            let joined: Vec<_> = classpath.iter().map(|p| p.display().to_string()).collect();
            line.push("-classpath".to_string());
            line.push(joined.join(separator));
        }
        line.push(self.main_class.clone());
        line.extend(self.args.iter().cloned());
        line
    }
}

/// `$JAVA_HOME/bin/java`, or `java` from the `PATH`
pub fn default_java() -> PathBuf {
    std::env::var_os("JAVA_HOME")
        .map(|home| PathBuf::from(home).join("bin").join("java"))
        .unwrap_or_else(|| PathBuf::from("java"))
}

/// Parts of an installed distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistContent {
    /// Runtime classpath files into `lib/`
    RuntimeLibs,
    /// The project archive into `lib/`
    ProjectArchive,
    /// Generated scripts from a directory into `bin/`
    Scripts(PathBuf),
    /// Compiler files into `graalCompiler/`
    Compiler,
}

/// An installable distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSpec {
    /// Distribution name
    pub name: String,
    /// Install directory
    pub install_dir: PathBuf,
    /// Contents, copied in order
    pub contents: Vec<DistContent>,
}

impl DistributionSpec {
    pub fn new(name: impl Into<String>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            install_dir: install_dir.into(),
            contents: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: DistContent) -> Self {
        self.include(content);
        self
    }

    /// Add a content item unless it is already included
    pub fn include(&mut self, content: DistContent) {
        if !self.contents.contains(&content) {
            self.contents.push(content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_dependencies_are_unique() {
        let mut task = Task::new("run", TaskKind::Exec(ExecSpec::new("a.Main")))
            .with_dependency(PREPARE_COMPILER_TASK);
        task.depend_on(PREPARE_COMPILER_TASK);
        task.add_hook(TaskHook::ConfigureRuntime);
        task.add_hook(TaskHook::ConfigureRuntime);
        assert_eq!(task.depends_on, vec![PREPARE_COMPILER_TASK]);
        assert_eq!(task.hooks.len(), 1);
    }

    #[test]
    fn test_command_line() {
        let mut spec = ExecSpec::new("experiment.Main")
            .with_jvm_args(vec!["-Xss2m".to_string()])
            .with_args(vec!["input.sl".to_string()]);
        spec.system_property("truffle.class.path.append", "/a.jar");
        spec.add_jvm_args(["-Xss2m", "-XX:+EnableJVMCI"]);

        let line = spec.command_line(&[PathBuf::from("/x.jar"), PathBuf::from("/y.jar")], ":");
        assert_eq!(
            line,
            vec![
                "-Xss2m",
                "-XX:+EnableJVMCI",
                "-Dtruffle.class.path.append=/a.jar",
                "-classpath",
                "/x.jar:/y.jar",
                "experiment.Main",
                "input.sl",
            ]
        );
    }

    #[test]
    fn test_distribution_contents_unique() {
        let mut dist = DistributionSpec::new("main", "/p/build/install/app")
            .with_content(DistContent::RuntimeLibs);
        dist.include(DistContent::Compiler);
        dist.include(DistContent::Compiler);
        assert_eq!(
            dist.contents,
            vec![DistContent::RuntimeLibs, DistContent::Compiler]
        );
    }

    #[test]
    fn test_kind_type_names() {
        assert_eq!(TaskKind::PrepareCompiler.type_name(), "prepare-compiler");
        assert_eq!(TaskKind::GraalComponent.type_name(), "graal-component");
    }
}
