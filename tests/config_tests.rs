//! Configuration Integration Tests
//!
//! Tests for loading reporter options from files:
//! - String and object forms
//! - Rotation and queue settings
//! - Rejection of invalid and unknown options

use std::fs;
use std::time::Duration;

use file_reporter::config::{DEFAULT_HIGH_WATER_MARK, DEFAULT_QUEUE_CAPACITY};
use file_reporter::{ReporterError, ReporterOptions, RotationTarget, StopMode};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("reporter.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_object_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        r#"{
            "file": "/var/log/app/events",
            "maxLogSize": 300,
            "stopMode": "discard",
            "queueCapacity": 16,
            "events": { "log": ["error"], "request": "*" }
        }"#,
    );

    let settings = ReporterOptions::from_file(&path).unwrap().resolve().unwrap();
    assert_eq!(settings.target, RotationTarget::file("/var/log/app/events"));
    assert_eq!(settings.rotation.max_bytes(), Some(300));
    assert_eq!(settings.rotation.interval(), None);
    assert_eq!(settings.stop_mode, StopMode::Discard);
    assert_eq!(settings.queue.capacity, 16);
    assert_eq!(settings.queue.high_water_mark, DEFAULT_HIGH_WATER_MARK);
    assert!(!settings.events.is_empty());
}

#[test]
fn test_load_string_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, r#""./logs/app""#);

    let settings = ReporterOptions::from_file(&path).unwrap().resolve().unwrap();
    assert_eq!(settings.target, RotationTarget::file("./logs/app"));
    assert_eq!(settings.queue.capacity, DEFAULT_QUEUE_CAPACITY);
    assert_eq!(settings.stop_mode, StopMode::Drain);
}

#[test]
fn test_directory_config_with_prefix_and_extension() {
    let options = ReporterOptions::from_json_str(
        r#"{ "path": "/var/log/app", "prefix": "api", "extension": ".jsonl", "rotationTime": 0.00001 }"#,
    )
    .unwrap();
    let settings = options.resolve().unwrap();

    match settings.target {
        RotationTarget::Directory {
            directory,
            prefix,
            extension,
            name_format,
        } => {
            assert_eq!(directory, std::path::PathBuf::from("/var/log/app"));
            assert_eq!(prefix.as_deref(), Some("api"));
            assert_eq!(extension, "jsonl");
            assert_eq!(name_format, None);
        }
        other => panic!("expected a directory target, got {other:?}"),
    }
    assert_eq!(settings.rotation.interval(), Some(Duration::from_millis(864)));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = ReporterOptions::from_json_str(r#"{ "file": "./app", "maxSize": 10 }"#).unwrap_err();
    assert!(matches!(err, ReporterError::Json(_)));
}

#[test]
fn test_invalid_values_are_config_errors() {
    for json in [
        r#"{}"#,
        r#"{ "file": "./a", "path": "./b" }"#,
        r#"{ "file": "./a", "maxLogSize": 0 }"#,
        r#"{ "file": "./a", "rotationTime": -1 }"#,
        r#"{ "file": "./a", "events": { "log": "all" } }"#,
        r#""""#,
    ] {
        let options = ReporterOptions::from_json_str(json).unwrap();
        let err = options.resolve().unwrap_err();
        assert!(matches!(err, ReporterError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = ReporterOptions::from_file(temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ReporterError::Io(_)));
}
