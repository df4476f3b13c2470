//! Integration tests for the `init` command.
//!
//! These tests run the binary and check the files it leaves behind.

use tempfile::TempDir;

mod common;
use common::run_trellis_in_dir;

#[test]
fn test_init_creates_workspace_files() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_trellis_in_dir(temp_dir.path(), &["init", "--quiet"]);
    assert!(output.status.success(), "Init command should succeed");
    assert!(output.stdout.is_empty(), "--quiet prints nothing");

    let trellis_dir = temp_dir.path().join(".trellis");
    assert!(trellis_dir.is_dir());
    assert!(trellis_dir.join(".gitignore").exists());

    let issues = std::fs::read_to_string(trellis_dir.join("issues.jsonl")).unwrap();
    assert!(issues.is_empty(), "issues.jsonl should be empty initially");

    let config = std::fs::read_to_string(trellis_dir.join("config.yaml")).unwrap();
    assert!(config.contains("issue-prefix: proj"));
    assert!(config.contains("backend: jsonl"));
    assert!(config.contains("data-file:"));
}

#[test]
fn test_init_with_custom_prefix() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_trellis_in_dir(temp_dir.path(), &["init", "--prefix", "web"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Issue prefix: web"));

    let config = std::fs::read_to_string(temp_dir.path().join(".trellis/config.yaml")).unwrap();
    assert!(config.contains("issue-prefix: web"));
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();

    assert!(run_trellis_in_dir(temp_dir.path(), &["init", "-q"]).status.success());
    let output = run_trellis_in_dir(temp_dir.path(), &["init", "-q"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already initialized"));
}

#[test]
fn test_init_rejects_invalid_prefix() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_trellis_in_dir(temp_dir.path(), &["init", "--prefix", "no spaces"]);
    assert!(!output.status.success());
    assert!(!temp_dir.path().join(".trellis").exists());
}

#[test]
fn test_commands_outside_workspace_fail() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_trellis_in_dir(temp_dir.path(), &["ready"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a trellis workspace"));
}
