//! Compiler and language wiring for build targets
//!
//! The enhancer attaches dependency edges and hooks to existing tasks. It
//! only adds what is missing, so it can run over the same tasks repeatedly.

use crate::classpath::Classpath;
use crate::probe::RuntimeCapability;
use crate::script::{jvmci_flags, TRUFFLE_CLASS_PATH_PROPERTY};
use crate::targets::{DistContent, ExecSpec, TaskHook, TaskKind, PREPARE_COMPILER_TASK};
use crate::task_graph::TaskGraph;
use crate::warning::Warning;
use std::path::Path;

/// Attaches compiler wiring to tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetEnhancer;

impl TargetEnhancer {
    pub fn new() -> Self {
        Self
    }

    /// Wire every exec, start script and distribution task
    ///
    /// Returns the names of the tasks that were touched.
    pub fn enhance(&self, tasks: &mut TaskGraph) -> Vec<String> {
        let has_compiler = tasks.contains(PREPARE_COMPILER_TASK);
        let mut touched = Vec::new();

        for name in tasks.names() {
            let Some(task) = tasks.get_mut(&name) else {
                continue;
            };
            match &mut task.kind {
                TaskKind::Exec(_) => {
                    if has_compiler {
                        task.depend_on(PREPARE_COMPILER_TASK);
                    }
                    task.add_hook(TaskHook::ConfigureRuntime);
                }
                TaskKind::StartScripts(_) => {
                    task.add_hook(TaskHook::PatchScripts);
                }
                TaskKind::InstallDist(dist) => {
                    dist.include(DistContent::Compiler);
                    if has_compiler {
                        task.depend_on(PREPARE_COMPILER_TASK);
                    }
                }
                _ => continue,
            }
            touched.push(name);
        }

        tracing::debug!("Enhanced {} tasks", touched.len());
        touched
    }

    /// Apply the capability-specific flags to an exec spec before it runs
    ///
    /// `live_classpath` is the dynamic-load classpath joined with the host
    /// separator; it is only used on runtimes with a built-in compiler.
    pub fn configure_exec(
        &self,
        task: &str,
        spec: &mut ExecSpec,
        capability: RuntimeCapability,
        compiler_dir: &Path,
        live_classpath: &str,
    ) -> Option<Warning> {
        match capability {
            RuntimeCapability::BuiltInCompiler => {
                spec.system_property(TRUFFLE_CLASS_PATH_PROPERTY, live_classpath);
                None
            }
            RuntimeCapability::JitCapable => {
                spec.add_jvm_args(jvmci_flags(&compiler_dir.display().to_string()));
                None
            }
            RuntimeCapability::Interpreted => Some(Warning::InterpreterOnly {
                task: task.to_string(),
            }),
        }
    }
}

/// Join a live classpath with the host separator
pub fn join_live(classpath: &Classpath, windows: bool) -> String {
    classpath.join(if windows { ";" } else { ":" })
}
