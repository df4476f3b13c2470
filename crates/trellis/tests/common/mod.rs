//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use trellis::Engine;
use trellis::domain::{Issue, IssueType, NewIssue};
use trellis::storage::in_memory::InMemoryStore;

/// Run the trellis binary in the specified directory
pub fn run_trellis_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute trellis binary")
}

/// Create an issue through the CLI and return its id
pub fn create_issue(dir: &Path, title: &str, extra: &[&str]) -> String {
    let mut args = vec!["--json", "create", title];
    args.extend_from_slice(extra);
    let output = run_trellis_in_dir(dir, &args);
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

/// Engine over a fresh in-memory store
pub fn memory_engine() -> Engine {
    Engine::new(Arc::new(InMemoryStore::new("t")))
}

/// Create an issue of the given type
pub async fn issue(engine: &Engine, title: &str, issue_type: IssueType) -> Issue {
    engine
        .create_issue(NewIssue::new(title).with_type(issue_type))
        .await
        .unwrap()
}
