//! Dependency configuration graph
//!
//! Configurations are named dependency sets related by `extendsFrom`. A
//! configuration's effective members are its own declarations followed by
//! those of every ancestor. The graph has two phases: declarations are only
//! accepted while it is open, resolution only after it has been closed.

use crate::error::{BuildError, BuildResult};
use crate::resolver::ArtifactResolver;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle phase of a configuration graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Configurations and dependencies may be declared
    Declaration,
    /// Declarations are frozen; configurations may be resolved
    Closed,
}

/// Well-known configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationRole {
    /// Graal compiler and its dependencies
    GraalCompiler,
    /// Languages loaded through the dynamic-load classpath
    Language,
    /// Languages already installed in the target runtime
    InstalledLanguage,
    /// Basis of the dynamic-load classpath
    TruffleClasspath,
    /// Compile and runtime dependencies of the project
    Implementation,
    /// Runtime-only dependencies of the project
    RuntimeOnly,
    /// Everything needed to run the project
    RuntimeClasspath,
}

impl ConfigurationRole {
    /// Configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GraalCompiler => "graalCompiler",
            Self::Language => "language",
            Self::InstalledLanguage => "installedLanguage",
            Self::TruffleClasspath => "truffleClasspath",
            Self::Implementation => "implementation",
            Self::RuntimeOnly => "runtimeOnly",
            Self::RuntimeClasspath => "runtimeClasspath",
        }
    }

    /// Whether the configuration may be depended upon by name
    pub fn visible(&self) -> bool {
        !matches!(self, Self::GraalCompiler | Self::TruffleClasspath)
    }

    /// Whether the configuration may be resolved directly
    pub fn resolvable(&self) -> bool {
        matches!(
            self,
            Self::GraalCompiler | Self::TruffleClasspath | Self::RuntimeClasspath
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::GraalCompiler => "Graal compiler and its dependencies.",
            Self::Language => "Graal languages which should be dynamically loaded.",
            Self::InstalledLanguage => {
                "Graal languages which are already installed in the runtime."
            }
            Self::TruffleClasspath => "Files appended to the Truffle class path.",
            Self::Implementation => "Implementation dependencies.",
            Self::RuntimeOnly => "Runtime only dependencies.",
            Self::RuntimeClasspath => "Runtime classpath of the project.",
        }
    }

    /// Look up a role by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|role| role.name() == name)
    }

    pub fn all() -> [ConfigurationRole; 7] {
        [
            Self::GraalCompiler,
            Self::Language,
            Self::InstalledLanguage,
            Self::TruffleClasspath,
            Self::Implementation,
            Self::RuntimeOnly,
            Self::RuntimeClasspath,
        ]
    }
}

impl fmt::Display for ConfigurationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Module coordinate (`group:name:version`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse a `group:name:version` string
    pub fn parse(s: &str) -> BuildResult<Self> {
        truffle_config::project::parse_coordinate(s)
            .map(|(group, name, version)| Self::new(group, name, version))
            .ok_or_else(|| BuildError::InvalidCoordinate(s.to_string()))
    }

    /// Conventional artifact file name (`name-version.jar`)
    pub fn file_name(&self) -> String {
        format!("{}-{}.jar", self.name, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dependency {
    /// External module, resolved through an [`ArtifactResolver`]
    Module(Coordinate),
    /// Local files
    Files(Vec<PathBuf>),
}

impl Dependency {
    /// Parse a module dependency
    pub fn module(coordinate: &str) -> BuildResult<Self> {
        Coordinate::parse(coordinate).map(Self::Module)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(coordinate) => write!(f, "{}", coordinate),
            Self::Files(files) => {
                let names: Vec<_> = files.iter().map(|p| p.display().to_string()).collect();
                write!(f, "files({})", names.join(", "))
            }
        }
    }
}

/// A named dependency set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    name: String,
    role: Option<ConfigurationRole>,
    description: Option<String>,
    visible: bool,
    resolvable: bool,
    extends_from: Vec<String>,
    dependencies: Vec<Dependency>,
}

impl Configuration {
    fn new(name: String, visible: bool, resolvable: bool) -> Self {
        Self {
            name,
            role: None,
            description: None,
            visible,
            resolvable,
            extends_from: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn for_role(role: ConfigurationRole) -> Self {
        let mut configuration =
            Self::new(role.name().to_string(), role.visible(), role.resolvable());
        configuration.role = Some(role);
        configuration.description = Some(role.description().to_string());
        configuration
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Well-known role, if this is one of the standard configurations
    pub fn role(&self) -> Option<ConfigurationRole> {
        self.role
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_resolvable(&self) -> bool {
        self.resolvable
    }

    /// Direct parents, in declaration order
    pub fn extends_from(&self) -> &[String] {
        &self.extends_from
    }

    /// Dependencies declared directly on this configuration
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_resolvable(&mut self, resolvable: bool) {
        self.resolvable = resolvable;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Declare a dependency; declaring the same dependency twice is a no-op
    pub fn add_dependency(&mut self, dependency: Dependency) {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }
}

/// Graph of configurations and their `extendsFrom` relation
#[derive(Debug, Clone)]
pub struct ConfigurationGraph {
    configurations: HashMap<String, Configuration>,
    /// Creation order, for deterministic iteration
    order: Vec<String>,
    phase: Phase,
}

impl ConfigurationGraph {
    /// Create a new empty graph in the declaration phase
    pub fn new() -> Self {
        Self {
            configurations: HashMap::new(),
            order: Vec::new(),
            phase: Phase::Declaration,
        }
    }

    /// Create a graph holding the base project configurations
    /// (`implementation`, `runtimeOnly`, `runtimeClasspath`)
    pub fn with_base_configurations() -> Self {
        let mut runtime = Configuration::for_role(ConfigurationRole::RuntimeClasspath);
        runtime.extends_from = vec![
            ConfigurationRole::Implementation.name().to_string(),
            ConfigurationRole::RuntimeOnly.name().to_string(),
        ];

        let mut graph = Self::new();
        for configuration in [
            Configuration::for_role(ConfigurationRole::Implementation),
            Configuration::for_role(ConfigurationRole::RuntimeOnly),
            runtime,
        ] {
            graph.order.push(configuration.name.clone());
            graph
                .configurations
                .insert(configuration.name.clone(), configuration);
        }
        graph
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Close the declaration phase. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.phase == Phase::Declaration {
            tracing::debug!(
                "Closing configuration graph with {} configurations",
                self.order.len()
            );
            self.phase = Phase::Closed;
        }
    }

    /// Create a configuration
    pub fn create_configuration(
        &mut self,
        name: impl Into<String>,
        visible: bool,
        resolvable: bool,
    ) -> BuildResult<&mut Configuration> {
        let name = name.into();
        self.ensure_open(&name)?;
        if self.configurations.contains_key(&name) {
            return Err(BuildError::DuplicateConfiguration { name });
        }
        self.order.push(name.clone());
        Ok(self
            .configurations
            .entry(name.clone())
            .or_insert_with(|| Configuration::new(name, visible, resolvable)))
    }

    /// Create a well-known configuration with its standard flags
    pub fn create_role(&mut self, role: ConfigurationRole) -> BuildResult<&mut Configuration> {
        let configuration =
            self.create_configuration(role.name(), role.visible(), role.resolvable())?;
        configuration.role = Some(role);
        configuration.set_description(role.description());
        Ok(configuration)
    }

    /// Get a configuration by name
    pub fn get(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    /// Get a well-known configuration
    pub fn by_role(&self, role: ConfigurationRole) -> Option<&Configuration> {
        self.configurations
            .get(role.name())
            .filter(|c| c.role == Some(role))
    }

    /// Get a configuration for modification (declaration phase only)
    pub fn configuration_mut(&mut self, name: &str) -> BuildResult<&mut Configuration> {
        self.ensure_open(name)?;
        self.configurations
            .get_mut(name)
            .ok_or_else(|| BuildError::configuration_not_found(name))
    }

    /// Declare a dependency on a configuration
    pub fn add_dependency(&mut self, name: &str, dependency: Dependency) -> BuildResult<()> {
        self.configuration_mut(name)?.add_dependency(dependency);
        Ok(())
    }

    /// All configurations in creation order
    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.order.iter().filter_map(|name| self.configurations.get(name))
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Make `child` extend `parent`
    ///
    /// Fails without modifying the graph if the edge would close a cycle.
    pub fn extend(&mut self, child: &str, parent: &str) -> BuildResult<()> {
        self.ensure_open(child)?;
        if !self.configurations.contains_key(parent) {
            return Err(BuildError::configuration_not_found(parent));
        }
        let existing = self
            .configurations
            .get(child)
            .ok_or_else(|| BuildError::configuration_not_found(child))?;
        if existing.extends_from.iter().any(|p| p == parent) {
            return Ok(());
        }

        if let Some(path) = self.path_between(parent, child) {
            let mut cycle = vec![child.to_string()];
            cycle.extend(path);
            return Err(BuildError::Cycle {
                child: child.to_string(),
                parent: parent.to_string(),
                cycle: cycle.join(" -> "),
            });
        }

        if let Some(configuration) = self.configurations.get_mut(child) {
            configuration.extends_from.push(parent.to_string());
        }
        Ok(())
    }

    /// Every transitive ancestor of `name`, nearest first, without duplicates
    pub fn ancestors(&self, name: &str) -> BuildResult<Vec<String>> {
        let configuration = self
            .get(name)
            .ok_or_else(|| BuildError::configuration_not_found(name))?;

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut frontier: Vec<&str> = configuration
            .extends_from
            .iter()
            .map(String::as_str)
            .collect();

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in frontier {
                if !seen.insert(parent) {
                    continue;
                }
                result.push(parent.to_string());
                if let Some(c) = self.get(parent) {
                    next.extend(c.extends_from.iter().map(String::as_str));
                }
            }
            frontier = next;
        }

        Ok(result)
    }

    /// Own dependencies plus those of every ancestor, first declaration wins
    pub fn effective_members(&self, name: &str) -> BuildResult<Vec<Dependency>> {
        let configuration = self
            .get(name)
            .ok_or_else(|| BuildError::configuration_not_found(name))?;

        let mut seen = HashSet::new();
        let mut members = Vec::new();
        let own = std::iter::once(configuration);
        let inherited = self
            .ancestors(name)?
            .into_iter()
            .filter_map(|ancestor| self.configurations.get(&ancestor));

        for c in own.chain(inherited) {
            for dependency in &c.dependencies {
                if seen.insert(dependency) {
                    members.push(dependency.clone());
                }
            }
        }
        Ok(members)
    }

    /// Resolve the files of a resolvable configuration
    pub fn resolve(
        &self,
        name: &str,
        resolver: &dyn ArtifactResolver,
    ) -> BuildResult<Vec<PathBuf>> {
        self.ensure_closed(name)?;
        let configuration = self
            .get(name)
            .ok_or_else(|| BuildError::configuration_not_found(name))?;
        if !configuration.resolvable {
            return Err(BuildError::unresolvable(
                name,
                "the configuration is declaration-only; resolve a configuration that extends it",
            ));
        }
        self.resolve_members(name, resolver)
    }

    /// Resolve the files of any configuration, ignoring its resolvable flag
    ///
    /// This is the equivalent of resolving a detached copy of the
    /// configuration; the phase rule still applies.
    pub fn resolve_detached(
        &self,
        name: &str,
        resolver: &dyn ArtifactResolver,
    ) -> BuildResult<Vec<PathBuf>> {
        self.ensure_closed(name)?;
        if !self.configurations.contains_key(name) {
            return Err(BuildError::configuration_not_found(name));
        }
        self.resolve_members(name, resolver)
    }

    fn resolve_members(
        &self,
        name: &str,
        resolver: &dyn ArtifactResolver,
    ) -> BuildResult<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for dependency in self.effective_members(name)? {
            let resolved = match &dependency {
                Dependency::Module(coordinate) => resolver
                    .resolve(coordinate)
                    .map_err(|e| BuildError::unresolvable(name, e))?,
                Dependency::Files(paths) => paths.clone(),
            };
            for file in resolved {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        tracing::debug!("Resolved configuration '{}' to {} files", name, files.len());
        Ok(files)
    }

    /// Path of configuration names from `from` up to `to` along `extendsFrom`
    fn path_between(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.dfs_path(from, to, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: &str,
        target: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(current.to_string());
        if current == target {
            return true;
        }
        if visited.insert(current.to_string()) {
            if let Some(configuration) = self.configurations.get(current) {
                for parent in &configuration.extends_from {
                    if self.dfs_path(parent, target, visited, path) {
                        return true;
                    }
                }
            }
        }
        path.pop();
        false
    }

    fn ensure_open(&self, name: &str) -> BuildResult<()> {
        match self.phase {
            Phase::Declaration => Ok(()),
            Phase::Closed => Err(BuildError::ConfigurationClosed {
                name: name.to_string(),
            }),
        }
    }

    fn ensure_closed(&self, name: &str) -> BuildResult<()> {
        match self.phase {
            Phase::Closed => Ok(()),
            Phase::Declaration => Err(BuildError::PrematureResolution {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for ConfigurationGraph {
    fn default() -> Self {
        Self::new()
    }
}
