//! Integration tests for the `gep` binary
//!
//! These tests cover JSON output and precondition failures; none of them
//! reaches the hosted model.

use std::io::Write;
use std::process::{Command, Output};

fn gep(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gep"))
        .args(args)
        .env_remove("ZHIPUAI_API_KEY")
        .env_remove("GEP_BASE_URL")
        .env_remove("GEP_VISION_MODEL")
        .env_remove("GEP_CHAT_MODEL")
        .env_remove("GEP_REQUEST_TIMEOUT_SECS")
        .env_remove("GEP_MAX_RETRIES")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_table_json_lists_every_category() {
    let output = gep(&["table", "--json"]);
    assert!(output.status.success());

    let parsed = stdout_json(&output);
    assert_eq!(parsed["status"], "success");
    let rows = parsed["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 14);
    assert_eq!(rows[0]["category"], "旱地 (农田)");
    assert_eq!(rows[1]["coefficients"]["water_supply"], -2.63);
}

#[test]
fn test_table_filters_by_land_class() {
    let output = gep(&["table", "--category", "森林", "--json"]);
    assert!(output.status.success());

    let parsed = stdout_json(&output);
    let rows = parsed["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["land_class"] == "森林"));
}

#[test]
fn test_unknown_category_fails() {
    let output = gep(&["table", "--category", "竹林"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("竹林"));
}

#[test]
fn test_config_reports_sources() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "vision_model = \"glm-4v\"").unwrap();
    let path = file.path().to_str().unwrap();

    let output = gep(&["--config", path, "--chat-model", "glm-4-flash", "config", "--json"]);
    assert!(output.status.success());

    let parsed = stdout_json(&output);
    let entries = parsed["data"]["entries"].as_array().unwrap();
    let find = |key: &str| entries.iter().find(|e| e["key"] == key).unwrap().clone();

    assert_eq!(find("vision_model")["value"], "glm-4v");
    assert_eq!(find("vision_model")["source"], "File");
    assert_eq!(find("chat_model")["value"], "glm-4-flash");
    assert_eq!(find("chat_model")["source"], "Cli");
    assert_eq!(find("base_url")["source"], "Default");
    assert_eq!(parsed["data"]["api_key_set"], false);
}

#[test]
fn test_config_file_rejects_api_key() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api_key = \"secret\"").unwrap();
    let path = file.path().to_str().unwrap();

    let output = gep(&["--config", path, "config"]);
    assert!(!output.status.success());
}

#[test]
fn test_assess_missing_image_fails() {
    let output = gep(&["assess", "/nonexistent/photo.png", "--json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Image file not found"));
}

#[test]
fn test_assess_without_key_fails_before_any_request() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not inspected before the key check").unwrap();
    let path = file.path().to_str().unwrap();

    let output = gep(&["assess", path, "--json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ZHIPUAI_API_KEY"));
}
