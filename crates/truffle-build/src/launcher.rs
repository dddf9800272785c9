//! Application start scripts
//!
//! [`StartScripts`] describes the launchers of a distribution. Turning that
//! description into files is delegated to a [`ScriptGenerator`].

use crate::classpath::LIB_DIR;
use crate::error::{BuildError, BuildResult};
use crate::script::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Launcher description for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartScripts {
    /// Script base name
    pub application_name: String,
    /// Fully qualified main class
    pub main_class: String,
    /// File names under the distribution's `lib/`, in classpath order
    pub classpath: Vec<String>,
    /// Options passed to the JVM before user options
    pub default_jvm_opts: Vec<String>,
    /// Directory the scripts are written to
    pub output_dir: PathBuf,
}

impl StartScripts {
    pub fn new(
        application_name: impl Into<String>,
        main_class: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            application_name: application_name.into(),
            main_class: main_class.into(),
            classpath: Vec::new(),
            default_jvm_opts: Vec::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<String>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn with_default_jvm_opts(mut self, options: Vec<String>) -> Self {
        self.default_jvm_opts = options;
        self
    }

    pub fn unix_script(&self) -> PathBuf {
        self.output_dir.join(&self.application_name)
    }

    pub fn windows_script(&self) -> PathBuf {
        self.output_dir.join(format!("{}.bat", self.application_name))
    }

    pub fn script(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Unix => self.unix_script(),
            Platform::Windows => self.windows_script(),
        }
    }
}

/// Writes launcher files for a [`StartScripts`] description
pub trait ScriptGenerator {
    fn generate(&self, scripts: &StartScripts) -> BuildResult<()>;
}

/// Plain `sh` and `cmd` launchers
///
/// The installation root is `..` relative to the script. Default options are
/// written verbatim, so placeholders survive until substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScriptGenerator;

impl DefaultScriptGenerator {
    pub fn unix_content(scripts: &StartScripts) -> String {
        let classpath: Vec<_> = scripts
            .classpath
            .iter()
            .map(|name| format!("$APP_HOME/{}/{}", LIB_DIR, name))
            .collect();
        let options: Vec<_> = scripts
            .default_jvm_opts
            .iter()
            .map(|o| format!("\"{}\"", o.replace('"', "\\\"").replace('\'', "'\"'\"'")))
            .collect();

        format!(
            r#"#!/bin/sh
#
# {name} start up script for UN*X
#

APP_HOME=$(cd "$(dirname "$0")/.." > /dev/null && pwd -P)

DEFAULT_JVM_OPTS='{options}'

CLASSPATH={classpath}

if [ -n "$JAVA_HOME" ] ; then
    JAVACMD=$JAVA_HOME/bin/java
else
    JAVACMD=java
fi

eval "exec \"\$JAVACMD\" $DEFAULT_JVM_OPTS \$JAVA_OPTS -classpath \"\$CLASSPATH\" {main} \"\$@\""
"#,
            name = scripts.application_name,
            options = options.join(" "),
            classpath = classpath.join(":"),
            main = scripts.main_class,
        )
    }

    pub fn windows_content(scripts: &StartScripts) -> String {
        let classpath: Vec<_> = scripts
            .classpath
            .iter()
            .map(|name| format!("%APP_HOME%\\{}\\{}", LIB_DIR, name))
            .collect();
        let options: Vec<_> = scripts
            .default_jvm_opts
            .iter()
            .map(|o| format!("\"{}\"", o.replace('"', "\"\"")))
            .collect();

        format!(
            "@if \"%DEBUG%\" == \"\" @echo off\r\n\
             @rem {name} startup script for Windows\r\n\
             \r\n\
             setlocal\r\n\
             set APP_HOME=%~dp0..\r\n\
             \r\n\
             set DEFAULT_JVM_OPTS={options}\r\n\
             \r\n\
             set CLASSPATH={classpath}\r\n\
             \r\n\
             set JAVA_EXE=java.exe\r\n\
             if defined JAVA_HOME set JAVA_EXE=%JAVA_HOME%\\bin\\java.exe\r\n\
             \r\n\
             \"%JAVA_EXE%\" %DEFAULT_JVM_OPTS% %JAVA_OPTS% -classpath \"%CLASSPATH%\" {main} %*\r\n\
             \r\n\
             endlocal\r\n",
            name = scripts.application_name,
            options = options.join(" "),
            classpath = classpath.join(";"),
            main = scripts.main_class,
        )
    }
}

impl ScriptGenerator for DefaultScriptGenerator {
    fn generate(&self, scripts: &StartScripts) -> BuildResult<()> {
        fs::create_dir_all(&scripts.output_dir)
            .map_err(|e| BuildError::io(&scripts.output_dir, e))?;

        let unix = scripts.unix_script();
        write_script(&unix, &Self::unix_content(scripts))?;
        make_executable(&unix)?;

        let windows = scripts.windows_script();
        write_script(&windows, &Self::windows_content(scripts))?;

        tracing::debug!(
            "Generated start scripts for {} in {}",
            scripts.application_name,
            scripts.output_dir.display()
        );
        Ok(())
    }
}

fn write_script(path: &Path, content: &str) -> BuildResult<()> {
    fs::write(path, content).map_err(|e| BuildError::io(path, e))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> BuildResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| BuildError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> BuildResult<()> {
    Ok(())
}
