use std::path::Path;
use std::process::{Command, Output};

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_contestdesk"))
        .arg("--db")
        .arg(dir.join("problems.sqlite3"))
        .arg("--log-dir")
        .arg(dir.join("logs"))
        .arg("--log-level")
        .arg("debug")
        .args(args)
        .env_remove("CONTESTDESK_DB")
        .env_remove("CONTESTDESK_LOG_LEVEL")
        .env_remove("CONTESTDESK_LOG_DIR")
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn seed(dir: &Path) {
    for (id, name) in [("p1", "Alpha"), ("p2", "Beta"), ("p3", "Gamma")] {
        stdout_of(&run(dir, &["add", "--id", id, "--name", name]));
    }
    stdout_of(&run(dir, &["move", "C", "A"]));
}

#[test]
fn empty_store_lists_no_problems() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout_of(&run(dir.path(), &["list"]));
    assert_eq!(out, "No problems yet.\n");
}

#[test]
fn add_move_and_list_follow_order_index() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let out = stdout_of(&run(dir.path(), &["list"]));
    assert_eq!(
        out,
        "A - Gamma  (p3)\nB - Alpha  (p1)\nC - Beta  (p2)\n"
    );
}

#[test]
fn list_json_carries_labels_and_full_names() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let out = stdout_of(&run(dir.path(), &["list", "--json"]));
    let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows[0]["label"], "A");
    assert_eq!(rows[0]["id"], "p3");
    assert_eq!(rows[2]["fullName"], "Beta");
}

#[test]
fn delete_by_id_removes_entry() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let out = stdout_of(&run(dir.path(), &["delete", "--id", "p1"]));
    assert_eq!(out, "deleted p1\n");

    let out = stdout_of(&run(dir.path(), &["list"]));
    assert_eq!(out, "A - Gamma  (p3)\nB - Beta  (p2)\n");
    let out = stdout_of(&run(dir.path(), &["check"]));
    assert_eq!(out, "problem list is consistent\n");
}

#[test]
fn edit_and_show_problem() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    stdout_of(&run(
        dir.path(),
        &["edit", "B", "--full-name", "Alpha Strikes Back", "--content", "Sum two numbers."],
    ));
    let out = stdout_of(&run(dir.path(), &["show", "--id", "p1", "--json"]));
    let problem: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(problem["name"], "Alpha");
    assert_eq!(problem["fullName"], "Alpha Strikes Back");
    assert_eq!(problem["content"], "Sum two numbers.");
    assert!(problem["createdAt"].as_i64().unwrap() > 0);
    assert!(problem["updatedAt"].as_i64().unwrap() > 0);
    assert!(problem.get("created_at").is_none());
}

#[test]
fn export_reports_undefined_format() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = run(dir.path(), &["export", "--all"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("boca-zip"), "stderr: {stderr}");
}

#[test]
fn out_of_range_move_fails_without_change() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = run(dir.path(), &["move", "A", "Z"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("out of range"), "stderr: {stderr}");

    let out = stdout_of(&run(dir.path(), &["list"]));
    assert!(out.starts_with("A - Gamma"));
}

#[test]
fn version_needs_no_store() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout_of(&run(dir.path(), &["version"]));
    assert!(out.starts_with("contestdesk "));
    assert!(!dir.path().join("problems.sqlite3").exists());
}
