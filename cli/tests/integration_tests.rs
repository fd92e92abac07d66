use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn content_blocks(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_content-blocks"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run content-blocks")
}

fn write_document(root: &Path, kind_dir: &str, folder: &str, yaml: &str) {
    let dir = root.join(kind_dir).join(folder);
    fs::create_dir_all(&dir).expect("failed to create content block folder");
    fs::write(dir.join("config.yaml"), yaml).expect("failed to write document");
}

/// Project with one teaser content element and a `content-blocks.yaml`.
fn write_project(dir: &Path, format: &str) -> PathBuf {
    write_document(
        &dir.join("blocks"),
        "ContentElements",
        "teaser",
        r#"
name: acme/teaser
title: Teaser
fields:
  - identifier: headline
    type: Text
    label: Headline
  - identifier: header
    useExistingField: true
"#,
    );
    let config = dir.join("content-blocks.yaml");
    fs::write(
        &config,
        format!("version: \"1.0\"\nsources:\n  - blocks\noutput:\n  format: {format}\n"),
    )
    .expect("failed to write config");
    config
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

#[test]
fn compile_prints_json_result() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "json");

    let output = content_blocks(&["--config", config.to_str().unwrap(), "compile"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let fields = &result["tables"]["tt_content"]["fields"];
    assert!(fields.get("acme_teaser_headline").is_some());
    assert!(fields.get("header").is_some());
    assert!(result["language_keys"].get("acme/teaser").is_some());
}

#[test]
fn compile_uses_configured_yaml_format() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "yaml");

    let output = content_blocks(&["--config", config.to_str().unwrap(), "compile"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let result: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert!(result["tables"]["tt_content"].is_mapping());
}

#[test]
fn compile_format_flag_overrides_config_and_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "yaml");
    let target = dir.path().join("compiled.json");

    let output = content_blocks(&[
        "--config",
        config.to_str().unwrap(),
        "compile",
        "--format",
        "json",
        "--output",
        target.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let written = fs::read_to_string(&target).unwrap();
    let result: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(result["tables"].get("tt_content").is_some());
}

#[test]
fn compile_accepts_explicit_sources() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        "RecordTypes",
        "person",
        "name: acme/person\ntable: tx_acme_person\nfields:\n  - identifier: name\n    type: Text\n",
    );

    let output = content_blocks(&["compile", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(
        result["tables"]["tx_acme_person"]["fields"]
            .get("acme_person_name")
            .is_some()
    );
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "json");

    let output = content_blocks(&["--config", config.to_str().unwrap(), "validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("Validated 1 content type(s) across 1 table(s)."));
    assert!(out.contains("tt_content:"));
}

#[test]
fn validate_reports_error_code_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_document(
        dir.path(),
        "ContentElements",
        "teaser",
        "name: acme/teaser\nfields:\n  - identifier: headline\n    type: Headline\n",
    );

    let output = content_blocks(&["validate", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    assert!(err.contains("error: [1700000201]"), "stderr: {err}");
    assert!(err.contains("Headline"));
}

#[test]
fn validate_rejects_duplicate_names() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), "ContentElements", "one", "name: acme/teaser\n");
    write_document(dir.path(), "ContentElements", "two", "name: acme/teaser\n");

    let output = content_blocks(&["validate", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("defined twice"));
}

#[test]
fn missing_config_file_fails() {
    let output = content_blocks(&["--config", "/nonexistent/content-blocks.yaml", "validate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to load"));
}

// ---------------------------------------------------------------------------
// language-keys
// ---------------------------------------------------------------------------

#[test]
fn language_keys_scaffold_lists_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "json");

    let output = content_blocks(&[
        "--config",
        config.to_str().unwrap(),
        "language-keys",
        "--scaffold",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let keys: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let teaser = &keys["acme/teaser"];
    assert_eq!(teaser["title"], "Teaser");
    assert_eq!(teaser["headline.label"], "Headline");
}

#[test]
fn language_keys_full_references() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "json");

    let output = content_blocks(&["--config", config.to_str().unwrap(), "language-keys"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let keys: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = keys["acme/teaser"].as_array().unwrap();
    assert!(
        entries
            .iter()
            .any(|k| k["path"].as_str().unwrap().starts_with("LLL:EXT:"))
    );
}

// ---------------------------------------------------------------------------
// types
// ---------------------------------------------------------------------------

#[test]
fn types_lists_catalog_names() {
    let output = content_blocks(&["types"]);
    assert!(output.status.success());

    let names: Vec<String> = stdout(&output).lines().map(String::from).collect();
    assert!(names.contains(&"Text".to_string()));
    assert!(names.contains(&"Collection".to_string()));
    assert!(names.contains(&"FlexForm".to_string()));
}

#[test]
fn types_json_includes_descriptors() {
    let output = content_blocks(&["types", "--format", "json"]);
    assert!(output.status.success());

    let descriptors: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let text = descriptors
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "Text")
        .unwrap();
    assert_eq!(text["searchable"], true);
}

#[test]
fn unknown_format_is_rejected() {
    let output = content_blocks(&["types", "--format", "xml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown output format"));
}
