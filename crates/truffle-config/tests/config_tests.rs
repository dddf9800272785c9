//! Configuration loading and precedence tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use truffle_config::project::DependencySpec;
use truffle_config::{ConfigError, ConfigLoader, Plugin, ProjectConfig, PROJECT_FILE_NAME};

fn create_config_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_path = dir.join(PROJECT_FILE_NAME);
    fs::write(&config_path, content).unwrap();
    config_path
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new().with_global_config_path(dir.path().join("missing-global.toml"))
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn test_load_language_project() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[project]
name = "test-language"
plugins = ["language", "application"]

[graal]
language-id = "sl"

[application]
main-class = "experiment.TestLanguage"

[dependencies]
language = ["org.graalvm.js:js:20.1.0"]
installedLanguage = ["org.graalvm.python:python:20.1.0"]
"#,
    );

    let config = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.project_name().as_deref(), Some("test-language"));
    assert_eq!(
        config.project.plugins(),
        &[Plugin::Language, Plugin::Application]
    );
    assert_eq!(
        config.project.graal.as_ref().unwrap().language_id.as_deref(),
        Some("sl")
    );
    assert_eq!(
        config.project.dependencies["language"],
        vec![DependencySpec::Coordinate(
            "org.graalvm.js:js:20.1.0".to_string()
        )]
    );
}

#[test]
fn test_load_when_no_config_exists() {
    let temp_dir = TempDir::new().unwrap();

    let config = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(!config.is_project());
    assert!(config.project.project.is_none());
}

#[test]
fn test_load_from_file_sets_root() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[project]\nname = \"specific\"\n");

    let config = loader(&temp_dir).load_from_file(&path).unwrap();
    assert_eq!(config.project_root(), Some(temp_dir.path()));
}

#[test]
fn test_unnamed_project_uses_directory_name() {
    let temp_dir = TempDir::new().unwrap();
    let project_dir = temp_dir.path().join("my-dir");
    fs::create_dir(&project_dir).unwrap();
    create_config_file(&project_dir, "[graal]\nversion = \"20.2.0\"\n");

    let config = loader(&temp_dir).load_from_directory(&project_dir).unwrap();
    assert_eq!(config.project_name().as_deref(), Some("my-dir"));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_invalid_toml_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[project\nname = ");

    let err = loader(&temp_dir).load_from_file(&path).unwrap_err();
    match err {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("Expected TomlParseError, got {:?}", other),
    }
}

#[test]
fn test_unknown_field_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[project]
name = "p"
edition = "2026"
"#,
    );

    assert!(loader(&temp_dir).load_from_file(&path).is_err());
}

#[rstest]
#[case("[graal]\nversion = \"\"\n")]
#[case("[graal]\nlanguage-id = \"has space\"\n")]
#[case("[application]\nmain-class = \"\"\n")]
#[case("[dependencies]\nlanguage = [\"not-a-coordinate\"]\n")]
#[case("[dependencies]\nlanguage = [{ files = [] }]\n")]
fn test_invalid_values(#[case] content: &str) {
    let config: ProjectConfig = toml::from_str(content).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { .. })
    ));
}
