//! Integration tests for the `fireboard` CLI binary.
//!
//! Argument parsing, help output, config handling, and node-bound commands
//! against a wiremock node. Never touches the user's real configuration.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fireboard` binary with env isolation.
fn fireboard_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fireboard");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("FIREBOARD_PROFILE")
        .env_remove("FIREBOARD_NODE")
        .env_remove("FIREBOARD_EVENTS")
        .env_remove("FIREBOARD_NAMESPACE")
        .env_remove("FIREBOARD_OUTPUT")
        .env_remove("FIREBOARD_INSECURE")
        .env_remove("FIREBOARD_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &std::path::Path, contents: &str) {
    let dir = home.join(".config").join("fireboard");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "header": { "id": "m1", "author": "org1" }, "data": [{ "id": "d1" }], "local": false },
            { "header": { "id": "m2", "author": "org2" }, "data": [{ "id": "d2" }], "local": true }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/data/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d1", "value": "hello" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/data/d2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = fireboard_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("messages")
            .and(predicate::str::contains("send"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("status")),
    );
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fireboard"));
}

#[test]
fn test_send_requires_text() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .arg("send")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("TEXT"));
}

#[test]
fn test_private_send_is_unsupported() {
    let home = tempfile::tempdir().unwrap();
    let output = fireboard_cmd(home.path())
        .args(["send", "--private", "hi"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(combined_output(&output).contains("Private send is not supported"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_config_home() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fireboard").and(predicate::str::ends_with("config.toml\n")));
}

#[test]
fn test_config_init_then_show() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .args(["config", "init", "--node", "http://localhost:5001", "--namespace", "ops"])
        .assert()
        .success();

    fireboard_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://localhost:5001")
                .and(predicate::str::contains("\"namespace\": \"ops\"")),
        );

    // A second init without --force refuses to overwrite.
    fireboard_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .args(["--profile", "nope", "messages"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_invalid_node_url_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    fireboard_cmd(home.path())
        .args(["--node", "not a url", "messages"])
        .assert()
        .code(2);
}

// ── Node-bound commands ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_messages_plain_lines() {
    let server = MockServer::start().await;
    mock_feed(&server).await;
    let home = tempfile::tempdir().unwrap();

    fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "messages", "-o", "plain"])
        .assert()
        .success()
        .stdout("From org1: [\"hello\"]\nFrom self: [null]\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_messages_uses_output_default_from_config_file() {
    let server = MockServer::start().await;
    mock_feed(&server).await;
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "[defaults]\noutput = \"plain\"\n");

    fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "messages"])
        .assert()
        .success()
        .stdout("From org1: [\"hello\"]\nFrom self: [null]\n");
}

#[test]
fn test_config_path_works_with_broken_config_file() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "[defaults\n");

    fireboard_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("config.toml\n"));
    fireboard_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_messages_json_includes_ids() {
    let server = MockServer::start().await;
    mock_feed(&server).await;
    let home = tempfile::tempdir().unwrap();

    let output = fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "ls", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries[0]["id"], "m1");
    assert_eq!(entries[0]["values"], json!(["hello"]));
    assert_eq!(entries[1]["sender"], "self");
    assert_eq!(entries[1]["values"], json!([null]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_posts_broadcast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/namespaces/default/broadcast/message"))
        .and(body_json(json!({ "data": [{ "value": "ping" }] })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "header": { "id": "m42", "author": "org1" },
            "data": [{ "id": "d42" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "send", "ping", "-o", "plain"])
        .assert()
        .success()
        .stdout("m42\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_node_error_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "FF10100: boom" })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "messages"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("FF10100: boom"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_node_exit_code() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);
    let home = tempfile::tempdir().unwrap();

    fireboard_cmd(home.path())
        .args(["--node", &uri, "--timeout", "5", "status"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not reach node"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_plain_prints_node_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node": { "name": "node_0", "registered": true },
            "org": { "name": "org_0" }
        })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    fireboard_cmd(home.path())
        .args(["--node", &server.uri(), "status", "-o", "plain"])
        .assert()
        .success()
        .stdout("node_0\n");
}
