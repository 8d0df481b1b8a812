//! End-to-end tests for the `config` command.
//!
//! These tests invoke the actual CLI binary and check the composed
//! configuration it prints.

mod common;
use common::prelude::*;

use serde_json::Value;

fn composed(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("config output should be JSON")
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_contains_discovered_entries() {
    let fixture = TestFixture::new().with_theme_layout();

    let output = fixture.command().arg("config").output().unwrap();
    assert!(output.status.success());

    let config = composed(&output.stdout);
    let entry = config["entry"].as_object().unwrap();
    assert!(entry.contains_key("scripts/app"));
    assert!(entry.contains_key("styles/admin-settings"));
    assert!(entry.contains_key("client/widget"));
    assert!(entry.contains_key("packages/blocks"));
    assert!(!entry.contains_key("packages/docs"));
    assert_eq!(config["externals"]["@acme/blocks"][0], "acme");
    assert_eq!(config["output"]["chunkFilename"], "chunks/[name].js");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_with_base_file() {
    let fixture = TestFixture::new()
        .with_theme_layout()
        .with_file(
            "base.json",
            r#"{"entry": {"legacy": "./legacy.js"}, "output": {"filename": "[name].js"}, "plugins": []}"#,
        );

    let output = fixture
        .command()
        .args(["config", "--base", "base.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config = composed(&output.stdout);
    assert_eq!(config["entry"]["legacy"], "./legacy.js");
    assert_eq!(config["output"]["filename"], "[name].js");
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_rejects_non_object_base() {
    let fixture = TestFixture::new()
        .with_theme_layout()
        .with_file("base.json", "[1, 2, 3]");

    fixture
        .command()
        .args(["config", "--base", "base.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid base configuration"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_merge_and_set() {
    let fixture = TestFixture::new()
        .with_theme_layout()
        .with_file("merge.json", r#"{"devtool": "eval", "output": {"publicPath": "/a/"}}"#);

    let output = fixture
        .command()
        .args([
            "config",
            "--merge",
            "merge.json",
            "--set",
            "performance.hints=false",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config = composed(&output.stdout);
    assert_eq!(config["devtool"], "eval");
    assert_eq!(config["output"]["publicPath"], "/a/");
    assert_eq!(config["performance"]["hints"], false);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_entries_and_merge_conflict() {
    let fixture = TestFixture::new().with_theme_layout();

    fixture
        .command()
        .args(["config", "--entries", "a.json", "--merge", "b.json"])
        .assert()
        .failure();
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_production_mode_flag() {
    let fixture = TestFixture::new().with_theme_layout();

    let output = fixture
        .command()
        .args(["config", "--mode", "production"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config = composed(&output.stdout);
    assert_eq!(config["mode"], "production");
    assert_eq!(config["devtool"], false);
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_no_externals_env() {
    let fixture = TestFixture::new().with_theme_layout();

    let output = fixture
        .command()
        .env("WP_NO_EXTERNALS", "1")
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success());

    let config = composed(&output.stdout);
    assert!(config["externals"].get("@acme/blocks").is_none());
    let plugins: Vec<&str> = config["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["plugin"].as_str())
        .collect();
    assert!(!plugins.contains(&"@wordpress/dependency-extraction-webpack-plugin"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_strict_collision() {
    let fixture = TestFixture::new()
        .with_manifest(common::manifests::THEME)
        .with_file("resources/scripts/blocks/editor.js", "")
        .with_file("resources/scripts/blocks/blocks-editor.js", "");

    fixture
        .command()
        .args(["config", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scripts/blocks-editor"));

    fixture.command().arg("config").assert().success();
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_errors_reported_before_collisions() {
    let fixture = TestFixture::new()
        .with_manifest(common::manifests::THEME)
        .with_file("resources/scripts/blocks/editor.js", "")
        .with_file("resources/scripts/blocks/blocks-editor.js", "")
        .with_file("base.json", r#"{"plugins": 5}"#);

    fixture
        .command()
        .args(["config", "--strict", "--base", "base.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid base configuration"));

    fixture
        .command()
        .args(["config", "--strict", "--set", "output.path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected PATH=VALUE"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_invalid_settings_block() {
    let fixture = TestFixture::new().with_manifest(common::manifests::INVALID_BLOCK);

    fixture
        .command()
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("hint"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_config_writes_output_file() {
    let fixture = TestFixture::new().with_theme_layout();

    fixture
        .command()
        .args(["config", "--out", "webpack.json"])
        .assert()
        .success();

    fixture
        .child("webpack.json")
        .assert(predicate::str::contains("\"entry\""));
}
