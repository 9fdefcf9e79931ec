#![allow(unused)]
//! Command-layer integration harness.
//!
//! # What this covers
//!
//! - **File loading**: payload and label files are read from disk, with
//!   contextual errors for missing files and invalid JSON.
//! - **Commands**: `normalize`, `summarize` and `aggregate` produce the same
//!   results as calling the core engine directly.
//! - **Device ids**: serial number first, file stem as the fallback.
//! - **Configuration**: a `config.toml` layered over the defaults changes
//!   rendering; a missing file yields the defaults.
//!
//! # What this does NOT cover
//!
//! - Argument parsing of the binary itself (clap derives it)
//! - The `--debug` log file
//!
//! # Running
//!
//! ```sh
//! cargo test --test cli_harness
//! ```

mod common;
use common::*;
use fleetnorm::commands::{read_labels, read_payload, render, AggregateRequest, Engine};
use fleetnorm_core::{Config, MessageKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

#[test]
fn normalize_command_matches_core() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "mac.json", &mac_payload());
    let normalized = Engine::default().normalize_file(&path).unwrap();
    assert_eq!(normalized, fleetnorm_core::normalize_payload(&mac_payload()));
}

#[test]
fn summarize_command_reports_platform() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "win.json", &windows_payload());
    let summary = Engine::default().summarize_file(&path).unwrap();
    let rendered: Value = serde_json::from_str(&render(&summary, true).unwrap()).unwrap();
    assert_eq!(rendered["platform"], "windows");
    assert_eq!(rendered["management"]["provider"], "Microsoft Intune");
}

#[test]
fn missing_and_invalid_files_carry_context() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    let err = read_payload(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{not json").unwrap();
    let err = read_payload(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("parsing"));
}

#[test]
fn device_ids_prefer_serial_then_file_stem() {
    let dir = TempDir::new().unwrap();
    let with_serial = write_json(&dir, "first.json", &json!({"serial_number": "SN-1"}));
    let without = write_json(&dir, "second-device.json", &json!({"hostname": "h"}));
    let engine = Engine::default();
    assert_eq!(engine.load_device(&with_serial).unwrap().id, "SN-1");
    assert_eq!(engine.load_device(&without).unwrap().id, "second-device");
}

#[test]
fn aggregate_command_with_labels_and_item() {
    let dir = TempDir::new().unwrap();
    let a = write_json(
        &dir,
        "a.json",
        &json!({"serial_number": "A", "installs": {"items": [{"name": "Zoom", "errors": ["boom"]}]}}),
    );
    let b = write_json(
        &dir,
        "b.json",
        &json!({"serial_number": "B", "installs": {"items": [{"name": "zoom", "errors": ["boom"]}]}}),
    );
    let labels = write_json(&dir, "labels.json", &json!({"A": "Reception", "B": 42}));

    let request = AggregateRequest {
        files: vec![a, b],
        kind: MessageKind::Errors,
        item: Some("ZOOM".to_string()),
        labels: Some(read_labels(&labels).unwrap()),
    };
    let groups = Engine::default().aggregate_files(&request).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count, 2);
    let labels: Vec<&str> = groups[0].devices.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["Reception", "B"]);
}

#[test]
fn aggregate_without_files_is_an_error() {
    let request = AggregateRequest {
        files: Vec::new(),
        kind: MessageKind::Warnings,
        item: None,
        labels: None,
    };
    assert!(Engine::default().aggregate_files(&request).is_err());
}

#[test]
fn labels_file_must_be_an_object() {
    let dir = TempDir::new().unwrap();
    let path = write_json(&dir, "labels.json", &json!(["A", "B"]));
    assert!(read_labels(&path).is_err());
}

#[test]
fn config_file_layers_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[display]\nunknown_label = \"n/a\"\n").unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.display.unknown_label, "n/a");
    assert_eq!(config.display.timestamp_format, "%b %-d, %Y %H:%M");
    assert_eq!(config.normalize.max_depth, 64);

    let payload = write_json(&dir, "empty.json", &json!({}));
    let summary = Engine::new(&config).summarize_file(&payload).unwrap();
    assert_eq!(summary.management.last_check_in.text, "n/a");
}

#[test]
fn missing_config_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert!(config.normalize.decode_embedded);
    assert_eq!(config.display.unknown_label, "Unknown");
}

#[test]
fn compact_and_pretty_rendering() {
    let value = json!({"a": 1});
    assert_eq!(render(&value, true).unwrap(), r#"{"a":1}"#);
    assert!(render(&value, false).unwrap().contains('\n'));
}
