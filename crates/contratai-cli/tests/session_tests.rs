//! Integration tests for session commands

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn contratai_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("contratai").unwrap();
    cmd.env("CONTRATAI_DB", dir.path().join("test.sqlite"))
        .env("CONTRATAI_CONFIG", dir.path().join("config.yml"));
    cmd
}

fn create_session(dir: &TempDir) -> String {
    let output = contratai_cmd(dir)
        .args(["sessions", "create"])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn test_sessions_list_empty() {
    let dir = TempDir::new().unwrap();
    contratai_cmd(&dir)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));
}

#[test]
fn test_sessions_create_then_list() {
    let dir = TempDir::new().unwrap();
    let id = create_session(&dir);
    assert_eq!(id.len(), 8);

    contratai_cmd(&dir)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("0 messages"));
}

#[test]
fn test_sessions_list_json() {
    let dir = TempDir::new().unwrap();
    let id = create_session(&dir);

    let output = contratai_cmd(&dir)
        .args(["sessions", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let sessions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sessions[0]["id"], id.as_str());
    assert_eq!(sessions[0]["message_count"], 0);
}

#[test]
fn test_sessions_show_unknown_is_not_found() {
    let dir = TempDir::new().unwrap();
    contratai_cmd(&dir)
        .args(["sessions", "show", "deadbeef"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Session not found"));
}

#[test]
fn test_sessions_show_existing() {
    let dir = TempDir::new().unwrap();
    let id = create_session(&dir);

    contratai_cmd(&dir)
        .args(["sessions", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Session {}", id)));
}

#[test]
fn test_sessions_delete() {
    let dir = TempDir::new().unwrap();
    let id = create_session(&dir);

    contratai_cmd(&dir)
        .args(["sessions", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted session"));

    contratai_cmd(&dir)
        .args(["sessions", "delete", &id])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_sessions_clear() {
    let dir = TempDir::new().unwrap();
    create_session(&dir);
    create_session(&dir);

    contratai_cmd(&dir)
        .args(["sessions", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 2 sessions"));

    contratai_cmd(&dir)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));
}

#[test]
fn test_sessions_replace_from_file() {
    let dir = TempDir::new().unwrap();
    let id = create_session(&dir);
    let file = dir.path().join("messages.json");
    std::fs::write(
        &file,
        r#"[{"role": "user", "content": "Quando cessa a menoridade?"},
            {"role": "assistant", "content": "Aos dezoito anos completos."}]"#,
    )
    .unwrap();

    contratai_cmd(&dir)
        .args(["sessions", "replace", &id, "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 messages"));

    let output = contratai_cmd(&dir)
        .args(["sessions", "show", &id, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let session: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(session["messages"].as_array().unwrap().len(), 2);
    assert_eq!(session["messages"][1]["role"], "assistant");
    assert_eq!(session["messages"][1]["content"], "Aos dezoito anos completos.");
}

#[test]
fn test_sessions_replace_from_stdin_rejects_bad_json() {
    let dir = TempDir::new().unwrap();
    contratai_cmd(&dir)
        .args(["sessions", "replace", "abc12345"])
        .write_stdin(r#"{"role": "user"}"#)
        .assert()
        .failure()
        .code(3);
}
