//! CLI integration tests
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const MISSING_KEY: &str = "Missing API key. Please set the GEMINI_API_KEY environment variable.";

/// Runs from an empty directory without a credential so no `.env` or real
/// key can leak into a test.
fn cmd(workdir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sitelift");
    cmd.current_dir(workdir.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("SITELIFT_MODEL")
        .env_remove("SITELIFT_BASE_URL")
        .env_remove("SITELIFT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("{}/../../tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn get_reply_path(name: &str) -> String {
    get_fixture_path(&format!("replies/{}", name))
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be a single JSON document")
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("chat"));
}

#[test]
fn test_cli_completions() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sitelift"));
}

#[test]
fn test_extract_without_key_reports_config_error() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "", "products"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["error"], MISSING_KEY);
    assert_eq!(result["data"], json!([]));
    assert_eq!(result["input_tokens"], 0);
    assert_eq!(result["output_tokens"], 0);
    assert_eq!(result["url"], get_fixture_path("shop.html"));
}

#[test]
fn test_extract_products_from_fenced_reply() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "name,price,description", "products"])
        .args(["--replay", &get_reply_path("products_fenced.txt")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert!(result.get("error").is_none());
    let data = result["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "Blue Widget");
    assert_eq!(data[0]["description"], "A sturdy blue widget for everyday tinkering.");
    assert_eq!(data[1]["price"], "$12.50");
    assert_eq!(result["cost"], 0.0);
}

#[test]
fn test_extract_about_from_prose_reply() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "", "about"])
        .args(["--replay", &get_reply_path("about_prose.txt")])
        .output()
        .unwrap();

    let result = stdout_json(&output);
    assert_eq!(
        result["data"],
        json!({"companyName": "Acme Widgets", "mission": "Make widgets everyone can use."})
    );
}

#[test]
fn test_extract_plain_reply_degrades_to_single_record() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "", "faq"])
        .args(["--replay", &get_reply_path("faq_plain.txt")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert!(result.get("error").is_none());
    assert_eq!(result["data"].as_array().unwrap().len(), 1);
}

#[test]
fn test_extract_missing_page_is_fetch_error() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", "missing-page.html", "", "contact"])
        .args(["--replay", &get_reply_path("about_prose.txt")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["error"], "Failed to fetch content");
    assert_eq!(result["data"], json!({}));
    assert_eq!(result["url"], "missing-page.html");
}

#[test]
fn test_extract_stdin_input() {
    let dir = TempDir::new().unwrap();
    let html = std::fs::read_to_string(get_fixture_path("shop.html")).unwrap();
    let output = cmd(&dir)
        .args(["extract", "-", "", "products"])
        .args(["--replay", &get_reply_path("products_fenced.txt")])
        .write_stdin(html)
        .output()
        .unwrap();

    let result = stdout_json(&output);
    assert_eq!(result["url"], "-");
    assert_eq!(result["data"].as_array().unwrap().len(), 2);
}

#[test]
fn test_extract_pretty_output() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "", "about", "--pretty"])
        .args(["--replay", &get_reply_path("about_prose.txt")])
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    assert!(stdout.contains("\n  \"url\""));
    assert_eq!(stdout_json(&output)["data"]["companyName"], "Acme Widgets");
}

#[test]
fn test_extract_missing_replay_file_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["extract", &get_fixture_path("shop.html"), "", "about"])
        .args(["--replay", "no-such-reply.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read replay file"));
}

#[test]
fn test_chat_with_replay() {
    let dir = TempDir::new().unwrap();
    let payload = std::fs::read_to_string(get_fixture_path("chat_payload.json")).unwrap();
    let output = cmd(&dir)
        .args(["chat", &payload, "--replay", &get_reply_path("chat_answer.txt")])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        json!({"response": "The Blue Widget costs $9.99 and is in stock."})
    );
}

#[test]
fn test_chat_payload_from_stdin() {
    let dir = TempDir::new().unwrap();
    let payload = std::fs::read_to_string(get_fixture_path("chat_payload.json")).unwrap();
    let output = cmd(&dir)
        .args(["chat", "-", "--replay", &get_reply_path("chat_answer.txt")])
        .write_stdin(payload)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout_json(&output)["response"].as_str().unwrap().contains("$9.99"));
}

#[test]
fn test_chat_without_key_returns_placeholder() {
    let dir = TempDir::new().unwrap();
    let payload = std::fs::read_to_string(get_fixture_path("chat_payload.json")).unwrap();
    let output = cmd(&dir).args(["chat", &payload]).output().unwrap();

    assert!(output.status.success());
    let reply = stdout_json(&output);
    assert_eq!(reply["response"], "I'm sorry, I couldn't access my knowledge base at the moment.");
    assert_eq!(reply["error"], MISSING_KEY);
}

#[test]
fn test_chat_invalid_json() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir).args(["chat", "{not json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let reply = stdout_json(&output);
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid JSON input"));
    assert_eq!(reply["response"], "Error processing your request.");
}

#[test]
fn test_chat_missing_query() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["chat", r#"{"websiteData": {"about": {"companyName": "Acme"}}}"#])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let reply = stdout_json(&output);
    assert_eq!(reply["error"], "Missing query or website data");
    assert_eq!(reply["response"], "Error processing your request.");
}
