//! Integration tests for the trellis CLI.
//!
//! Each test runs the built binary in a fresh workspace.

use rstest::{fixture, rstest};
use tempfile::TempDir;

mod common;
use common::{create_issue, run_trellis_in_dir};

/// Provides a temporary directory with an initialized workspace
#[fixture]
fn workspace() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_trellis_in_dir(temp.path(), &["init", "--prefix", "test", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize trellis: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = run_trellis_in_dir(dir.path(), &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("ready"));
}

#[rstest]
fn test_create_and_show(workspace: TempDir) {
    let id = create_issue(
        workspace.path(),
        "Design schema",
        &["-p", "1", "-D", "Tables and indexes"],
    );
    assert!(id.starts_with("test-"));

    let output = run_trellis_in_dir(workspace.path(), &["show", &id]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Design schema"));
    assert!(text.contains("Tables and indexes"));
    assert!(text.contains("P1"));
}

#[rstest]
fn test_ready_follows_blockers(workspace: TempDir) {
    let dir = workspace.path();
    let schema = create_issue(dir, "Design schema", &[]);
    let api = create_issue(dir, "Build API", &["--blocked-by", &schema]);

    let output = run_trellis_in_dir(dir, &["--json", "ready"]);
    assert!(output.status.success());
    let ready = json(&output);
    let ids: Vec<&str> = ready
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![schema.as_str()]);

    assert!(run_trellis_in_dir(dir, &["close", &schema]).status.success());

    let ready = json(&run_trellis_in_dir(dir, &["--json", "ready"]));
    assert_eq!(ready[0]["id"], api.as_str());
}

#[rstest]
fn test_cycle_is_refused_with_exit_code(workspace: TempDir) {
    let dir = workspace.path();
    let a = create_issue(dir, "A", &[]);
    let b = create_issue(dir, "B", &["--blocked-by", &a]);

    let output = run_trellis_in_dir(dir, &["dep", "add", &a, &b]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cycle"));

    let deps = json(&run_trellis_in_dir(dir, &["--json", "dep", "list", &a]));
    assert!(deps.as_array().unwrap().is_empty());
}

#[rstest]
fn test_hierarchy_violation_on_create(workspace: TempDir) {
    let dir = workspace.path();
    let task = create_issue(dir, "Task", &[]);

    let output = run_trellis_in_dir(dir, &["create", "Epic", "-t", "epic", "--parent", &task]);
    assert_eq!(output.status.code(), Some(4));

    // the failed create is not saved
    let list = json(&run_trellis_in_dir(dir, &["--json", "list"]));
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[rstest]
fn test_unknown_issue_exit_code(workspace: TempDir) {
    let output = run_trellis_in_dir(workspace.path(), &["show", "test-zzzz"]);
    assert_eq!(output.status.code(), Some(3));
}

#[rstest]
fn test_why_and_tree(workspace: TempDir) {
    let dir = workspace.path();
    let a = create_issue(dir, "Base", &[]);
    let b = create_issue(dir, "Top", &["--blocked-by", &a]);

    let why = stdout(&run_trellis_in_dir(dir, &["why", &b]));
    assert!(why.contains(&a));
    assert!(why.contains("Base"));

    let tree = json(&run_trellis_in_dir(dir, &["--json", "dep", "tree", &b]));
    assert_eq!(tree["issue_id"], b.as_str());
    assert_eq!(tree["dependencies"][0]["issue_id"], a.as_str());
    assert_eq!(tree["dependencies"][0]["dep_type"], "blocks");
}

#[rstest]
fn test_import_document(workspace: TempDir) {
    let dir = workspace.path();
    let plan = dir.join("plan.md");
    std::fs::write(
        &plan,
        "# Issues Structure\n- [epic] Payments, t=Epic\n    - [a] Schema\n    - [b] API, deps=[a]\n",
    )
    .unwrap();

    let output = run_trellis_in_dir(dir, &["import", "plan.md", "--validate-only"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("valid: 3 item(s)"));
    let list = json(&run_trellis_in_dir(dir, &["--json", "list"]));
    assert!(list.as_array().unwrap().is_empty());

    let report = json(&run_trellis_in_dir(dir, &["--json", "import", "plan.md"]));
    assert_eq!(report["created"], 3);
    assert_eq!(report["edges_created"], 3);

    let ready = json(&run_trellis_in_dir(dir, &["--json", "ready"]));
    assert_eq!(ready.as_array().unwrap().len(), 1);
    assert_eq!(ready[0]["title"], "Schema");
}

#[rstest]
fn test_import_invalid_document(workspace: TempDir) {
    let dir = workspace.path();
    std::fs::write(dir.join("bad.md"), "no outline here\n").unwrap();

    let output = run_trellis_in_dir(dir, &["import", "bad.md"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Missing '# Issues Structure' section"));
}

#[rstest]
fn test_reorder_children(workspace: TempDir) {
    let dir = workspace.path();
    let epic = create_issue(dir, "Epic", &["-t", "epic"]);
    let c1 = create_issue(dir, "C1", &["--parent", &epic]);
    let c2 = create_issue(dir, "C2", &["--parent", &epic]);

    assert!(run_trellis_in_dir(dir, &["reorder", &epic, &c2, &c1]).status.success());

    let children = json(&run_trellis_in_dir(dir, &["--json", "children", &epic]));
    assert_eq!(children[0]["id"], c2.as_str());
    assert_eq!(children[1]["id"], c1.as_str());
}
