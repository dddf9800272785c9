//! Project orchestration
//!
//! A [`Project`] owns the configuration graph, the Graal settings and the
//! task graph. It goes through two phases: while declarations are open,
//! plugins, dependencies, settings and tasks may be added; [`Project::close`]
//! freezes them, wires the compiler into the targets and allows resolution.
//! Executing a task closes the project first.

use crate::classpath::{Classpath, ClasspathComposer, ClasspathMode, ProjectOutputs};
use crate::compiler;
use crate::component::{build_component, ComponentSpec};
use crate::configuration::{ConfigurationGraph, ConfigurationRole, Dependency};
use crate::distribution::{self, DistributionInputs};
use crate::enhancer::{join_live, TargetEnhancer};
use crate::error::{BuildError, BuildResult};
use crate::identity::GraalSettings;
use crate::launcher::{DefaultScriptGenerator, ScriptGenerator, StartScripts};
use crate::native_image::{NativeImageSpec, NativeImageTask};
use crate::probe::{RuntimeCapability, RuntimeProbe, SystemProbe};
use crate::resolver::{ArtifactResolver, LocalRepository, StaticResolver};
use crate::script::ScriptPatcher;
use crate::targets::{
    DistContent, DistributionSpec, ExecSpec, Task, TaskHook, TaskKind, DIST_NATIVE_TASK,
    GRAAL_COMPONENT_TASK, INSTALL_DIST_TASK, PREPARE_COMPILER_TASK, RUN_TASK, START_SCRIPTS_TASK,
};
use crate::task_graph::TaskGraph;
use crate::warning::Warning;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use truffle_config::project::DependencySpec;
use truffle_config::{ApplicationConfig, Config, ConfigError, Plugin, GRAAL_VERSION_PROPERTY};

/// Project resources copied into the component archive
pub const COMPONENT_RESOURCES_DIR: &str = "src/main/component";

/// Task group of the Graal tasks
pub const GRAAL_GROUP: &str = "graal";

/// Task group of the application tasks
pub const APPLICATION_GROUP: &str = "application";

/// How a task finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// The task did work
    Executed,
    /// Every output was already current
    UpToDate,
}

/// Result of one executed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: String,
    pub status: TaskStatus,
    /// Files produced or verified by the task
    pub outputs: Vec<PathBuf>,
}

impl TaskOutcome {
    fn executed(task: &str, outputs: Vec<PathBuf>) -> Self {
        Self {
            task: task.to_string(),
            status: TaskStatus::Executed,
            outputs,
        }
    }
}

/// Result of one requested target
#[derive(Debug)]
pub struct TargetResult {
    pub target: String,
    /// Outcomes of the target and its dependencies, in execution order
    pub result: BuildResult<Vec<TaskOutcome>>,
}

/// Serializable summary of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub targets: Vec<TargetReport>,
    pub warnings: Vec<Warning>,
}

/// Serializable summary of one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: String,
    pub success: bool,
    pub outcomes: Vec<TaskOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildReport {
    pub fn new(results: &[TargetResult], warnings: &[Warning]) -> Self {
        let targets = results
            .iter()
            .map(|r| match &r.result {
                Ok(outcomes) => TargetReport {
                    target: r.target.clone(),
                    success: true,
                    outcomes: outcomes.clone(),
                    error: None,
                },
                Err(e) => TargetReport {
                    target: r.target.clone(),
                    success: false,
                    outcomes: Vec::new(),
                    error: Some(e.to_string()),
                },
            })
            .collect();
        Self {
            targets,
            warnings: warnings.to_vec(),
        }
    }

    pub fn success(&self) -> bool {
        self.targets.iter().all(|t| t.success)
    }
}

/// A Graal/Truffle project
pub struct Project {
    name: String,
    root: PathBuf,
    build_dir: PathBuf,
    plugins: Vec<Plugin>,
    properties: BTreeMap<String, String>,
    graph: ConfigurationGraph,
    graal: GraalSettings,
    application: Option<ApplicationConfig>,
    tasks: TaskGraph,
    resolver: Box<dyn ArtifactResolver>,
    probe: Box<dyn RuntimeProbe>,
    generator: Box<dyn ScriptGenerator>,
    warnings: Vec<Warning>,
    closed: bool,
}

impl Project {
    /// Create a project with the base configurations and no plugins
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let root = root.into();
        let build_dir = root.join("build");
        Self {
            graal: GraalSettings::new(name.clone(), &build_dir),
            name,
            root,
            build_dir,
            plugins: Vec::new(),
            properties: BTreeMap::new(),
            graph: ConfigurationGraph::with_base_configurations(),
            application: None,
            tasks: TaskGraph::new(),
            resolver: Box::new(StaticResolver::new()),
            probe: Box::new(SystemProbe::from_env()),
            generator: Box::new(DefaultScriptGenerator),
            warnings: Vec::new(),
            closed: false,
        }
    }

    /// Set the build directory; resets the Graal settings to their defaults
    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self.graal = GraalSettings::new(self.name.clone(), &self.build_dir);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ArtifactResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_probe(mut self, probe: impl RuntimeProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_generator(mut self, generator: impl ScriptGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Build a project from loaded configuration
    pub fn from_config(config: &Config) -> BuildResult<Self> {
        let root = config
            .project_root()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = config
            .project_name()
            .ok_or_else(|| ConfigError::ValidationError("the project has no name".to_string()))?;

        let mut project = Project::new(name, &root).with_build_dir(config.build_dir());
        if let Some(repository) = config.repository_path() {
            project = project.with_resolver(LocalRepository::new(root.join(repository)));
        }

        for plugin in config.project.plugins() {
            project.apply_plugin(*plugin)?;
        }

        for (key, value) in config.global.properties.iter().chain(&config.project.properties) {
            project.set_property(key, value)?;
        }

        if let Some(graal) = &config.project.graal {
            if let Some(version) = &graal.version {
                project.graal.set_version(version)?;
            }
            if let Some(id) = &graal.language_id {
                project.graal.set_language_id(id)?;
            }
            if let Some(name) = &graal.language_name {
                project.graal.set_language_name(name)?;
            }
            if let Some(dir) = &graal.output_dir {
                project.graal.set_output_dir(root.join(dir))?;
            }
            if let Some(dir) = &graal.compiler_dir {
                project.graal.set_compiler_dir(root.join(dir))?;
            }
        }

        if let Some(application) = &config.project.application {
            project.set_application(application.clone())?;
        }

        for (configuration, specs) in &config.project.dependencies {
            for spec in specs {
                let dependency = match spec {
                    DependencySpec::Coordinate(coordinate) => Dependency::module(coordinate)?,
                    DependencySpec::Files { files } => {
                        Dependency::Files(files.iter().map(|f| root.join(f)).collect())
                    }
                };
                project.add_dependency(configuration, dependency)?;
            }
        }

        for image in &config.project.native_images {
            let mut spec = NativeImageSpec::new().with_args(image.args.clone());
            if let Some(main_class) = &image.main_class {
                spec.set_main_class(main_class);
            }
            if let Some(jar) = &image.jar {
                spec.set_jar(root.join(jar));
            }
            spec.output_name = image.output_name.clone();
            spec.output_dir = image.output_dir.as_ref().map(|d| root.join(d));
            project.add_native_image(&image.name, spec)?;
        }

        Ok(project)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn graph(&self) -> &ConfigurationGraph {
        &self.graph
    }

    pub fn graal(&self) -> &GraalSettings {
        &self.graal
    }

    /// Graal settings; setters fail once the project is closed
    pub fn graal_mut(&mut self) -> &mut GraalSettings {
        &mut self.graal
    }

    pub fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Warnings collected so far, each reported once
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn has_plugin(&self, plugin: Plugin) -> bool {
        self.plugins.contains(&plugin)
    }

    /// Whether this project builds a language component
    pub fn is_component(&self) -> bool {
        self.has_plugin(Plugin::Language)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> BuildResult<()> {
        let key = key.into();
        self.ensure_open(&key)?;
        self.properties.insert(key, value.into());
        Ok(())
    }

    pub fn application(&self) -> Option<&ApplicationConfig> {
        self.application.as_ref()
    }

    pub fn set_application(&mut self, application: ApplicationConfig) -> BuildResult<()> {
        self.ensure_open("application")?;
        self.application = Some(application);
        Ok(())
    }

    /// Application name (default: project name)
    pub fn application_name(&self) -> &str {
        self.application
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or(&self.name)
    }

    /// Apply a plugin; applying it again is a no-op
    pub fn apply_plugin(&mut self, plugin: Plugin) -> BuildResult<()> {
        self.ensure_open(plugin.name())?;
        if self.has_plugin(plugin) {
            return Ok(());
        }

        match plugin {
            Plugin::Compiler => self.apply_compiler()?,
            Plugin::Language => {
                self.apply_plugin(Plugin::Compiler)?;
                self.tasks.add_task(
                    Task::new(GRAAL_COMPONENT_TASK, TaskKind::GraalComponent)
                        .with_group(GRAAL_GROUP)
                        .with_description("Builds the language component archive."),
                )?;
            }
            Plugin::NativeImage | Plugin::Application => {}
        }

        tracing::debug!("Applied plugin '{}' to {}", plugin.name(), self.name);
        self.plugins.push(plugin);
        Ok(())
    }

    fn apply_compiler(&mut self) -> BuildResult<()> {
        for role in [
            ConfigurationRole::GraalCompiler,
            ConfigurationRole::Language,
            ConfigurationRole::InstalledLanguage,
            ConfigurationRole::TruffleClasspath,
        ] {
            self.graph.create_role(role)?;
        }
        let truffle = ConfigurationRole::TruffleClasspath.name();
        let runtime = ConfigurationRole::RuntimeClasspath.name();
        self.graph.extend(truffle, ConfigurationRole::Language.name())?;
        self.graph.extend(runtime, ConfigurationRole::Language.name())?;
        self.graph.extend(runtime, ConfigurationRole::InstalledLanguage.name())?;

        self.tasks.add_task(
            Task::new(PREPARE_COMPILER_TASK, TaskKind::PrepareCompiler)
                .with_group(GRAAL_GROUP)
                .with_description("Copies the Graal compiler into the compiler directory."),
        )
    }

    /// Declare a dependency on a configuration
    pub fn add_dependency(
        &mut self,
        configuration: &str,
        dependency: Dependency,
    ) -> BuildResult<()> {
        self.graph.add_dependency(configuration, dependency)
    }

    /// Register a task
    pub fn add_task(&mut self, task: Task) -> BuildResult<()> {
        self.ensure_open(&task.name)?;
        self.tasks.add_task(task)
    }

    /// Register a native image task
    pub fn add_native_image(&mut self, name: &str, spec: NativeImageSpec) -> BuildResult<()> {
        self.add_task(
            Task::new(name, TaskKind::NativeImage(spec))
                .with_group(GRAAL_GROUP)
                .with_description("Builds a native executable."),
        )
    }

    /// Close declarations
    ///
    /// Fixes the compiler version, declares the compiler dependency, creates
    /// the application tasks, wires the compiler into every target and closes
    /// the configuration graph. Closing again does nothing.
    pub fn close(&mut self) -> BuildResult<()> {
        if self.closed {
            return Ok(());
        }

        let property = self.properties.get(GRAAL_VERSION_PROPERTY).cloned();
        if let Some(warning) = self.graal.freeze(property.as_deref()) {
            self.warn(warning);
        }

        if self.has_plugin(Plugin::Compiler) {
            if let Some(coordinate) = self.graal.compiler_coordinate() {
                self.graph.add_dependency(
                    ConfigurationRole::GraalCompiler.name(),
                    Dependency::Module(coordinate),
                )?;
            }
        }

        if self.has_plugin(Plugin::Application) {
            self.create_application_tasks()?;
        }

        if self.has_plugin(Plugin::Compiler) {
            TargetEnhancer::new().enhance(&mut self.tasks);
        }

        self.tasks.validate()?;
        self.graph.close();
        self.closed = true;
        tracing::debug!("Closed project {}", self.name);
        Ok(())
    }

    fn create_application_tasks(&mut self) -> BuildResult<()> {
        let application = self.application.clone().ok_or_else(|| {
            ConfigError::ValidationError(
                "the application plugin needs an [application] section with a main-class"
                    .to_string(),
            )
        })?;
        let app_name = self.application_name().to_string();
        let scripts_dir = self.build_dir.join("scripts");

        let run = ExecSpec::new(&application.main_class)
            .with_runtime_classpath()
            .with_jvm_args(application.jvm_args.clone());
        self.tasks.add_task(
            Task::new(RUN_TASK, TaskKind::Exec(run))
                .with_group(APPLICATION_GROUP)
                .with_description("Runs this project as a JVM application."),
        )?;

        let scripts = StartScripts::new(&app_name, &application.main_class, &scripts_dir)
            .with_default_jvm_opts(application.jvm_args.clone());
        self.tasks.add_task(
            Task::new(START_SCRIPTS_TASK, TaskKind::StartScripts(scripts))
                .with_group(APPLICATION_GROUP)
                .with_description("Creates OS specific scripts to run the project."),
        )?;

        let dist = DistributionSpec::new("main", self.build_dir.join("install").join(&app_name))
            .with_content(DistContent::ProjectArchive)
            .with_content(DistContent::RuntimeLibs)
            .with_content(DistContent::Scripts(scripts_dir));
        self.tasks.add_task(
            Task::new(INSTALL_DIST_TASK, TaskKind::InstallDist(dist))
                .with_group(APPLICATION_GROUP)
                .with_description("Installs the project as a distribution as-is.")
                .with_dependency(START_SCRIPTS_TASK),
        )?;

        if self.has_plugin(Plugin::NativeImage) && !self.tasks.contains(DIST_NATIVE_TASK) {
            let spec = NativeImageSpec::new()
                .for_main_class(&application.main_class)
                .with_output_name(&app_name)
                .with_output_dir(self.build_dir.join("distributions"));
            self.tasks.add_task(
                Task::new(DIST_NATIVE_TASK, TaskKind::NativeImage(spec))
                    .with_group(GRAAL_GROUP)
                    .with_description("Builds a native executable of the application."),
            )?;
        }
        Ok(())
    }

    /// The project archive (`<build>/libs/<name>.jar`)
    pub fn project_archive(&self) -> PathBuf {
        self.build_dir.join("libs").join(format!("{}.jar", self.name))
    }

    /// Compiled class and resource directories
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.build_dir.join("classes").join("java").join("main"),
            self.build_dir.join("resources").join("main"),
        ]
    }

    fn composer(&self) -> ClasspathComposer<'_> {
        let composer = ClasspathComposer::new(&self.graph, self.resolver.as_ref())
            .with_base_dir(&self.root);
        if self.is_component() {
            composer.with_component(ProjectOutputs {
                archive: self.project_archive(),
                output_dirs: self.output_dirs(),
            })
        } else {
            composer
        }
    }

    /// Dynamic-load classpath; the `Archived` projection uses the home placeholder
    pub fn classpath(&self, mode: ClasspathMode) -> BuildResult<Classpath> {
        self.require_compiler()?;
        self.composer().compose(mode)
    }

    /// Dynamic-load classpath projected onto an install root
    pub fn classpath_in(&self, install_root: &Path) -> BuildResult<Classpath> {
        self.require_compiler()?;
        self.composer()
            .with_install_root(install_root)
            .compose(ClasspathMode::Archived)
    }

    /// Files of `runtimeClasspath`
    pub fn runtime_classpath(&self) -> BuildResult<Vec<PathBuf>> {
        self.graph
            .resolve(ConfigurationRole::RuntimeClasspath.name(), self.resolver.as_ref())
            .map(|files| {
                files
                    .into_iter()
                    .map(|f| if f.is_absolute() { f } else { self.root.join(f) })
                    .collect()
            })
    }

    fn separator(&self) -> &'static str {
        if self.probe.is_windows() {
            ";"
        } else {
            ":"
        }
    }

    /// Run a task and everything it depends on
    pub fn execute(&mut self, target: &str) -> BuildResult<Vec<TaskOutcome>> {
        self.close()?;
        let plan = self.tasks.execution_plan(target)?;
        let mut outcomes = Vec::with_capacity(plan.len());
        for name in plan {
            outcomes.push(self.run_task(&name)?);
        }
        Ok(outcomes)
    }

    /// Run several targets; a failing target does not stop the others
    ///
    /// Tasks shared between targets run once. A target whose plan contains
    /// a task that already failed fails without running anything.
    pub fn execute_all<S: AsRef<str>>(&mut self, targets: &[S]) -> BuildResult<Vec<TargetResult>> {
        self.close()?;
        let mut done: HashSet<String> = HashSet::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        for target in targets {
            let target = target.as_ref();
            let result = self.execute_shared(target, &mut done, &mut failed);
            if let Err(e) = &result {
                tracing::warn!("Target '{}' failed: {}", target, e);
            }
            results.push(TargetResult {
                target: target.to_string(),
                result,
            });
        }
        Ok(results)
    }

    fn execute_shared(
        &mut self,
        target: &str,
        done: &mut HashSet<String>,
        failed: &mut HashSet<String>,
    ) -> BuildResult<Vec<TaskOutcome>> {
        let plan = self.tasks.execution_plan(target)?;
        if let Some(broken) = plan.iter().find(|t| failed.contains(*t)) {
            return Err(BuildError::TaskFailed {
                task: target.to_string(),
                reason: format!("dependency '{}' failed", broken),
            });
        }

        let mut outcomes = Vec::new();
        for name in plan {
            if done.contains(&name) {
                continue;
            }
            match self.run_task(&name) {
                Ok(outcome) => {
                    done.insert(name);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    failed.insert(name);
                    return Err(e);
                }
            }
        }
        Ok(outcomes)
    }

    fn run_task(&mut self, name: &str) -> BuildResult<TaskOutcome> {
        let task = self
            .tasks
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::task_not_found(name))?;
        tracing::debug!("Running task {} ({})", name, task.kind.type_name());

        match task.kind {
            TaskKind::PrepareCompiler => {
                let report = compiler::prepare_compiler(
                    &self.graph,
                    self.resolver.as_ref(),
                    self.graal.compiler_dir(),
                )?;
                Ok(TaskOutcome {
                    task: name.to_string(),
                    status: if report.is_up_to_date() {
                        TaskStatus::UpToDate
                    } else {
                        TaskStatus::Executed
                    },
                    outputs: report.files(),
                })
            }
            TaskKind::Exec(mut spec) => {
                if task.hooks.contains(&TaskHook::ConfigureRuntime) {
                    self.configure_exec(name, &mut spec)?;
                }
                self.run_exec(name, &spec)?;
                Ok(TaskOutcome::executed(name, Vec::new()))
            }
            TaskKind::StartScripts(mut scripts) => {
                let mut classpath = vec![file_name(&self.project_archive())];
                classpath.extend(self.runtime_classpath()?.iter().map(|f| file_name(f)));
                classpath.dedup();
                scripts.classpath = classpath;

                if task.hooks.contains(&TaskHook::PatchScripts) {
                    let component = if self.is_component() {
                        Some(self.classpath(ClasspathMode::Archived)?)
                    } else {
                        None
                    };
                    ScriptPatcher::for_distribution(component.as_ref())
                        .run(&mut scripts, self.generator.as_ref())?;
                } else {
                    self.generator.generate(&scripts)?;
                }

                let outputs = vec![scripts.unix_script(), scripts.windows_script()];
                if let Some(stored) = self.tasks.get_mut(name) {
                    stored.kind = TaskKind::StartScripts(scripts);
                }
                Ok(TaskOutcome::executed(name, outputs))
            }
            TaskKind::InstallDist(spec) => {
                let compiler_files = if spec.contents.contains(&DistContent::Compiler) {
                    compiler::compiler_files(&self.graph, self.resolver.as_ref())?
                } else {
                    Vec::new()
                };
                let archive = self.project_archive();
                let inputs = DistributionInputs {
                    runtime_libs: self.runtime_classpath()?,
                    project_archive: archive.is_file().then_some(archive),
                    compiler_files,
                };
                let report = distribution::install(&spec, &inputs)?;
                Ok(TaskOutcome {
                    task: name.to_string(),
                    status: if report.is_up_to_date() {
                        TaskStatus::UpToDate
                    } else {
                        TaskStatus::Executed
                    },
                    outputs: vec![spec.install_dir],
                })
            }
            TaskKind::GraalComponent => {
                // Identity first: nothing is resolved or written without it.
                self.graal.require_language_id(name)?;
                let archive = self.project_archive();
                let libraries = self
                    .classpath(ClasspathMode::Archived)?
                    .entries
                    .into_iter()
                    .map(|e| e.source)
                    .filter(|source| *source != archive || archive.is_file())
                    .collect();
                let spec = ComponentSpec::from_settings(
                    name,
                    &self.graal,
                    libraries,
                    Some(self.root.join(COMPONENT_RESOURCES_DIR)),
                )?;
                let archive = build_component(&spec)?;
                Ok(TaskOutcome::executed(name, vec![archive]))
            }
            TaskKind::NativeImage(spec) => {
                let classpath = if spec.needs_classpath() {
                    let mut files = Vec::new();
                    let archive = self.project_archive();
                    if archive.is_file() {
                        files.push(archive);
                    }
                    files.extend(self.runtime_classpath()?);
                    files
                } else {
                    Vec::new()
                };
                let image = NativeImageTask::new(name, &spec, &self.build_dir);
                let output =
                    image.run(self.probe.native_image_tool(), &classpath, self.separator())?;
                Ok(TaskOutcome::executed(name, vec![output]))
            }
        }
    }

    fn configure_exec(&mut self, name: &str, spec: &mut ExecSpec) -> BuildResult<()> {
        let capability = self.probe.capability();
        let live = match capability {
            RuntimeCapability::BuiltInCompiler => {
                join_live(&self.classpath(ClasspathMode::Live)?, self.probe.is_windows())
            }
            _ => String::new(),
        };
        let compiler_dir = self.absolute(self.graal.compiler_dir());
        if let Some(warning) =
            TargetEnhancer::new().configure_exec(name, spec, capability, &compiler_dir, &live)
        {
            self.warn(warning);
        }
        Ok(())
    }

    fn run_exec(&self, name: &str, spec: &ExecSpec) -> BuildResult<()> {
        let mut classpath = spec.classpath.clone();
        if spec.use_runtime_classpath {
            classpath.extend(self.output_dirs());
            classpath.extend(self.runtime_classpath()?);
        }
        let args = spec.command_line(&classpath, self.separator());
        let working_dir = spec.working_dir.as_deref().unwrap_or(self.root.as_path());

        tracing::debug!("Executing {} {}", spec.executable.display(), args.join(" "));
        let status = Command::new(&spec.executable)
            .args(&args)
            .current_dir(working_dir)
            .status()
            .map_err(|e| BuildError::TaskFailed {
                task: name.to_string(),
                reason: format!("cannot start {}: {}", spec.executable.display(), e),
            })?;

        if !status.success() {
            return Err(BuildError::TaskFailed {
                task: name.to_string(),
                reason: format!("{} exited with {}", spec.executable.display(), status),
            });
        }
        Ok(())
    }

    /// Record a warning once and log it
    fn warn(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            warning.emit();
            self.warnings.push(warning);
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn require_compiler(&self) -> BuildResult<()> {
        if self.has_plugin(Plugin::Compiler) {
            Ok(())
        } else {
            Err(BuildError::unresolvable(
                ConfigurationRole::TruffleClasspath.name(),
                "apply the compiler plugin to declare it",
            ))
        }
    }

    fn ensure_open(&self, name: &str) -> BuildResult<()> {
        if self.closed {
            return Err(BuildError::ConfigurationClosed {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project::new("test-language", "/p")
            .with_probe(FixedProbe::new(RuntimeCapability::JitCapable))
            .with_resolver(
                StaticResolver::new().with_artifact(
                    "org.graalvm.compiler:compiler:20.1.0",
                    ["/repo/compiler-20.1.0.jar"],
                ),
            )
    }

    #[test]
    fn test_compiler_plugin_declares_configurations() {
        let mut p = project();
        p.apply_plugin(Plugin::Compiler).unwrap();
        let graph = p.graph();
        assert!(graph.by_role(ConfigurationRole::GraalCompiler).is_some());
        assert_eq!(
            graph.get("truffleClasspath").unwrap().extends_from(),
            &["language"]
        );
        assert_eq!(
            graph.get("runtimeClasspath").unwrap().extends_from(),
            &["implementation", "runtimeOnly", "language", "installedLanguage"]
        );
        assert!(p.task(PREPARE_COMPILER_TASK).is_some());
    }

    #[test]
    fn test_language_plugin_implies_compiler() {
        let mut p = project();
        p.apply_plugin(Plugin::Language).unwrap();
        p.apply_plugin(Plugin::Language).unwrap();
        assert_eq!(p.plugins(), &[Plugin::Compiler, Plugin::Language]);
        assert!(p.task(GRAAL_COMPONENT_TASK).is_some());
    }

    #[test]
    fn test_close_adds_compiler_dependency() {
        let mut p = project();
        p.apply_plugin(Plugin::Compiler).unwrap();
        p.set_property("graalVersion", "20.2.0").unwrap();
        p.close().unwrap();
        assert_eq!(p.graal().version(), Some("20.2.0"));
        assert_eq!(
            p.graph().get("graalCompiler").unwrap().dependencies(),
            &[Dependency::module("org.graalvm.compiler:compiler:20.2.0").unwrap()]
        );
        assert!(p.warnings().is_empty());
    }

    #[test]
    fn test_mutation_after_close_fails() {
        let mut p = project();
        p.close().unwrap();
        p.close().unwrap();
        assert!(matches!(
            p.apply_plugin(Plugin::Compiler),
            Err(BuildError::ConfigurationClosed { .. })
        ));
        assert!(p.set_property("graalVersion", "1").is_err());
        assert!(p.graal_mut().set_language_id("sl").is_err());
        assert!(p
            .add_dependency("implementation", Dependency::module("a:b:1").unwrap())
            .is_err());
    }

    #[test]
    fn test_application_tasks_are_wired() {
        let mut p = project();
        p.apply_plugin(Plugin::Compiler).unwrap();
        p.apply_plugin(Plugin::Application).unwrap();
        p.apply_plugin(Plugin::NativeImage).unwrap();
        p.set_application(ApplicationConfig {
            name: Some("custom".to_string()),
            main_class: "experiment.Main".to_string(),
            jvm_args: vec![],
        })
        .unwrap();
        p.close().unwrap();

        let run = p.task(RUN_TASK).unwrap();
        assert_eq!(run.depends_on, vec![PREPARE_COMPILER_TASK]);
        assert!(run.has_hook(TaskHook::ConfigureRuntime));
        assert!(p.task(START_SCRIPTS_TASK).unwrap().has_hook(TaskHook::PatchScripts));
        match &p.task(DIST_NATIVE_TASK).unwrap().kind {
            TaskKind::NativeImage(spec) => {
                assert_eq!(spec.output_name.as_deref(), Some("custom"));
                assert_eq!(spec.output_dir, Some(PathBuf::from("/p/build/distributions")));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(
            p.tasks().execution_plan(INSTALL_DIST_TASK).unwrap(),
            vec![PREPARE_COMPILER_TASK, START_SCRIPTS_TASK, INSTALL_DIST_TASK]
        );
    }

    #[test]
    fn test_application_plugin_requires_main_class() {
        let mut p = project();
        p.apply_plugin(Plugin::Application).unwrap();
        assert!(matches!(p.close(), Err(BuildError::Config(_))));
    }

    #[test]
    fn test_interpreter_warning_recorded_once() {
        let mut p =
            Project::new("p", "/p").with_probe(FixedProbe::new(RuntimeCapability::Interpreted));
        p.apply_plugin(Plugin::Compiler).unwrap();
        p.graal_mut().set_version("20.1.0").unwrap();
        p.close().unwrap();

        let mut spec = ExecSpec::new("a.Main");
        p.configure_exec("run", &mut spec).unwrap();
        p.configure_exec("run", &mut spec).unwrap();
        assert_eq!(
            p.warnings(),
            &[Warning::InterpreterOnly {
                task: "run".to_string()
            }]
        );
    }

    #[test]
    fn test_classpath_without_compiler_plugin() {
        let mut p = project();
        p.close().unwrap();
        assert!(matches!(
            p.classpath(ClasspathMode::Live),
            Err(BuildError::Unresolvable { name, .. }) if name == "truffleClasspath"
        ));
        assert!(matches!(
            p.classpath_in(Path::new("/opt/plain")),
            Err(BuildError::Unresolvable { .. })
        ));
    }
}
