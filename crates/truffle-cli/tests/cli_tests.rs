//! CLI integration tests
//!
//! Every test runs the `truffle` binary against a project in a temporary
//! directory with an isolated home and a local artifact repository.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Command rooted at `dir` with no inherited truffle settings
fn truffle_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("truffle").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("TRUFFLE_GRAAL_VERSION")
        .env_remove("TRUFFLE_REPOSITORY")
        .env_remove("TRUFFLE_JSON")
        .env_remove("JAVA_HOME")
        .env_remove("GRAALVM_HOME");
    cmd
}

/// Place `<name>-<version>.jar` in the maven layout under `<root>/repo`
fn install_artifact(root: &Path, group: &str, name: &str, version: &str) {
    let dir = root
        .join("repo")
        .join(group.replace('.', "/"))
        .join(name)
        .join(version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}-{}.jar", name, version)), name).unwrap();
}

fn create_project(manifest: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("truffle.toml"), manifest).unwrap();
    install_artifact(temp.path(), "org.graalvm.compiler", "compiler", "20.1.0");
    install_artifact(temp.path(), "org.graalvm.compiler", "compiler", "20.2.0");
    install_artifact(temp.path(), "org.graalvm.js", "js", "20.1.0");
    temp
}

const JS_PROJECT: &str = r#"
[project]
name = "experiment"
plugins = ["compiler"]

[dependencies]
language = ["org.graalvm.js:js:20.1.0"]

[repository]
path = "repo"
"#;

const LANGUAGE_PROJECT: &str = r#"
[project]
name = "sl"
plugins = ["language"]

[properties]
graalVersion = "20.1.0"

[repository]
path = "repo"
"#;

mod help_messages {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let temp = TempDir::new().unwrap();
        truffle_cmd(temp.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("classpath"))
            .stdout(predicate::str::contains("prepare-compiler"))
            .stdout(predicate::str::contains("patch-scripts"))
            .stdout(predicate::str::contains("component"))
            .stdout(predicate::str::contains("native-image"))
            .stdout(predicate::str::contains("install"))
            .stdout(predicate::str::contains("tasks"));
    }

    #[test]
    fn test_classpath_help_shows_modes() {
        let temp = TempDir::new().unwrap();
        truffle_cmd(temp.path())
            .args(["classpath", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("live"))
            .stdout(predicate::str::contains("archived"));
    }
}

mod classpath {
    use super::*;

    #[test]
    fn test_outside_project_fails() {
        let temp = TempDir::new().unwrap();
        truffle_cmd(temp.path())
            .arg("classpath")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No truffle.toml found"));
    }

    #[test]
    fn test_archived_classpath() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .args(["classpath", "--mode", "archived"])
            .assert()
            .success()
            .stdout("<HOME>/lib/js-20.1.0.jar\n")
            .stderr(predicate::str::contains("Graal version not set. Defaulting to 20.1.0"));
    }

    #[test]
    fn test_install_root() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .args(["classpath", "--mode", "archived", "--install-root", "/opt/experiment"])
            .assert()
            .success()
            .stdout("/opt/experiment/lib/js-20.1.0.jar\n");
    }

    #[test]
    fn test_json_output() {
        let temp = create_project(JS_PROJECT);
        let output = truffle_cmd(temp.path())
            .args(["classpath", "--mode", "archived", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["mode"], "archived");
        assert_eq!(json["entries"][0]["path"], "<HOME>/lib/js-20.1.0.jar");
    }

    #[test]
    fn test_project_dir_flag() {
        let temp = create_project(JS_PROJECT);
        let elsewhere = TempDir::new().unwrap();
        truffle_cmd(elsewhere.path())
            .arg("-C")
            .arg(temp.path())
            .args(["classpath", "--mode", "archived"])
            .assert()
            .success()
            .stdout("<HOME>/lib/js-20.1.0.jar\n");
    }
}

mod build_tasks {
    use super::*;

    #[test]
    fn test_prepare_compiler() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .arg("prepare-compiler")
            .assert()
            .success()
            .stdout(predicate::str::contains("prepareCompiler (done)"));
        assert!(temp
            .path()
            .join("build/graalCompiler/compiler-20.1.0.jar")
            .is_file());

        truffle_cmd(temp.path())
            .arg("prepare-compiler")
            .assert()
            .success()
            .stdout(predicate::str::contains("prepareCompiler (up to date)"));
    }

    #[test]
    fn test_graal_version_flag_wins() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .env("TRUFFLE_GRAAL_VERSION", "20.1.0")
            .args(["prepare-compiler", "--graal-version", "20.2.0"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Graal version not set").not());
        assert!(temp
            .path()
            .join("build/graalCompiler/compiler-20.2.0.jar")
            .is_file());
    }

    #[test]
    fn test_graal_version_flag_overrides_manifest_version() {
        let temp = create_project(
            r#"
[project]
name = "experiment"
plugins = ["compiler"]

[graal]
version = "20.1.0"

[repository]
path = "repo"
"#,
        );
        truffle_cmd(temp.path())
            .args(["--graal-version", "20.2.0", "prepare-compiler"])
            .assert()
            .success();

        let compiler_dir = temp.path().join("build/graalCompiler");
        let mut names: Vec<String> = fs::read_dir(&compiler_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["compiler-20.2.0.jar"]);
    }

    #[test]
    fn test_component_without_language_id() {
        let temp = create_project(LANGUAGE_PROJECT);
        truffle_cmd(temp.path())
            .arg("component")
            .assert()
            .failure()
            .stdout(predicate::str::contains("language-id"));
        assert!(!temp.path().join("build/graalComponent").exists());
    }

    #[test]
    fn test_run_reports_json() {
        let temp = create_project(JS_PROJECT);
        let output = truffle_cmd(temp.path())
            .args(["run", "prepareCompiler", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["targets"][0]["target"], "prepareCompiler");
        assert_eq!(json["targets"][0]["success"], true);
        assert_eq!(json["warnings"][0]["kind"], "default-graal-version");
    }

    #[test]
    fn test_unknown_task() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .args(["run", "nope"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Task not found: nope"));
    }

    #[test]
    fn test_native_image_without_targets() {
        let temp = create_project(JS_PROJECT);
        truffle_cmd(temp.path())
            .arg("native-image")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no native image targets"));
    }
}

mod tasks {
    use super::*;

    #[test]
    fn test_lists_wired_tasks() {
        let temp = create_project(
            r#"
[project]
name = "experiment"
plugins = ["compiler", "application"]

[application]
main-class = "experiment.Main"

[repository]
path = "repo"
"#,
        );
        let output = truffle_cmd(temp.path())
            .args(["tasks", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let tasks = json["tasks"].as_array().unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["prepareCompiler", "startScripts", "run", "installDist"]
        );
        let run = tasks.iter().find(|t| t["name"] == "run").unwrap();
        assert_eq!(run["type"], "exec");
        assert_eq!(run["depends_on"][0], "prepareCompiler");
    }
}
