//! Graal/Truffle build wiring
//!
//! Provides the build-side plumbing for Truffle language projects:
//! - Configuration graph with typed roles and cycle-checked inheritance
//! - Graal version and language identity resolution
//! - Dynamic-load classpath composition (live and archived projections)
//! - Two-pass launcher script patching
//! - Compiler wiring for exec, start script and distribution targets
//! - Compiler preparation, component archives, native images and installs
//!
//! # Example
//!
//! ```no_run
//! use truffle_build::{ClasspathMode, Project};
//! use truffle_config::Plugin;
//!
//! let mut project = Project::new("my-language", ".");
//! project.apply_plugin(Plugin::Language).unwrap();
//! project.graal_mut().set_language_id("sl").unwrap();
//! project.close().unwrap();
//! let classpath = project.classpath(ClasspathMode::Archived).unwrap();
//! println!("{}", classpath.join(":"));
//! ```

pub mod classpath;
pub mod compiler;
pub mod component;
pub mod configuration;
pub mod copy;
pub mod distribution;
pub mod enhancer;
pub mod error;
pub mod identity;
pub mod launcher;
pub mod native_image;
pub mod probe;
pub mod project;
pub mod resolver;
pub mod script;
pub mod targets;
pub mod task_graph;
pub mod warning;

// Re-export main types
pub use classpath::{Classpath, ClasspathComposer, ClasspathEntry, ClasspathMode, ProjectOutputs};
pub use component::{build_component, ComponentSpec};
pub use configuration::{
    Configuration, ConfigurationGraph, ConfigurationRole, Coordinate, Dependency, Phase,
};
pub use copy::CopyReport;
pub use enhancer::TargetEnhancer;
pub use error::{BuildError, BuildResult};
pub use identity::{GraalSettings, ResolvedVersion, VersionSource, DEFAULT_GRAAL_VERSION};
pub use launcher::{DefaultScriptGenerator, ScriptGenerator, StartScripts};
pub use native_image::{EntryPoint, NativeImageSpec, NativeImageTask};
pub use probe::{FixedProbe, RuntimeCapability, RuntimeProbe, SystemProbe};
pub use project::{BuildReport, Project, TargetReport, TargetResult, TaskOutcome, TaskStatus};
pub use resolver::{ArtifactResolver, LocalRepository, ResolveError, StaticResolver};
pub use script::{
    CompilerFlags, DynamicLanguageFlags, FlagAugmenter, PatchReport, Platform, ScriptPatcher,
    HOME_PLACEHOLDER, PATHSEP_PLACEHOLDER,
};
pub use targets::{DistContent, DistributionSpec, ExecSpec, Task, TaskHook, TaskKind};
pub use task_graph::TaskGraph;
pub use warning::Warning;
