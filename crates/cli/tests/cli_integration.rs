//! CLI integration tests: command parsing, exit codes, and the
//! determinism of the written assembly.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Path to the nbstack binary built alongside the tests.
fn nbstack_bin() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("nbstack")
}

#[test]
fn cli_help_lists_commands() {
    let output = Command::new(nbstack_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("synth"));
    assert!(stdout.contains("validate"));
    assert!(stdout.contains("list"));
}

#[test]
fn cli_version() {
    let output = Command::new(nbstack_bin())
        .arg("--version")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nbstack"));
}

#[test]
fn synth_writes_assembly() {
    let dir = TempDir::new().expect("tempdir");
    let output = Command::new(nbstack_bin())
        .arg("synth")
        .arg("--output")
        .arg(dir.path())
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    assert!(dir.path().join("SageMakerNotebook.template.json").exists());
    assert!(dir.path().join("manifest.json").exists());
}

#[test]
fn synth_twice_is_byte_identical() {
    let dir = TempDir::new().expect("tempdir");
    let template_path = dir.path().join("SageMakerNotebook.template.json");

    let run = || {
        let output = Command::new(nbstack_bin())
            .arg("synth")
            .arg("--output")
            .arg(dir.path())
            .output()
            .expect("Failed to execute nbstack");
        assert!(output.status.success());
        fs::read(&template_path).expect("template written")
    };

    assert_eq!(run(), run());
}

#[test]
fn synth_print_emits_template_json() {
    let output = Command::new(nbstack_bin())
        .arg("synth")
        .arg("--print")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    let template: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON template");
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(template["Resources"].as_object().map(|r| r.len()), Some(5));
}

#[test]
fn synth_yaml_writes_yaml_template() {
    let dir = TempDir::new().expect("tempdir");
    let output = Command::new(nbstack_bin())
        .arg("synth")
        .arg("--output")
        .arg(dir.path())
        .arg("--format")
        .arg("yaml")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    assert!(dir.path().join("SageMakerNotebook.template.yaml").exists());
}

#[test]
fn validate_passes_shipped_declaration() {
    let output = Command::new(nbstack_bin())
        .arg("validate")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RoleHasPolicies"));
    assert!(!stdout.contains("FAIL"));
}

#[test]
fn list_json_names_notebook_instance() {
    let output = Command::new(nbstack_bin())
        .arg("list")
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to execute nbstack");

    assert!(output.status.success());
    let rows: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON rows");
    assert!(rows
        .iter()
        .any(|r| r["resource_type"] == "AWS::SageMaker::NotebookInstance"));
}
