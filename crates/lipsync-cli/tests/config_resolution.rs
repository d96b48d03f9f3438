//! Integration tests for configuration layering.
//!
//! Settings files are written to temporary directories; flags are layered on
//! top through the real clap parser.

use std::fs;
use std::path::Path;

use clap::Parser;
use lipsync_cli::{BackendKind, Cli, CliConfig, CliError};
use tempfile::TempDir;

fn write_settings(dir: &TempDir, json: &str) -> std::path::PathBuf {
    let path = dir.path().join("avatar.json");
    fs::write(&path, json).unwrap();
    path
}

fn parse(path: &Path, extra: &[&str]) -> Cli {
    let mut args = vec!["lipsync", "--config", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    args.push("voices");
    Cli::parse_from(args)
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        r#"{ "rate": 1.25, "tick_base_ms": 120, "preferred_voice_markers": ["Neural"] }"#,
    );

    let config = CliConfig::resolve(&parse(&path, &[])).unwrap();

    assert!((config.settings.rate - 1.25).abs() < f32::EPSILON);
    assert_eq!(config.settings.tick_base_ms, 120);
    assert_eq!(config.settings.preferred_voice_markers, vec!["Neural"]);
    // Untouched fields keep their defaults.
    assert!((config.settings.pitch - 1.1).abs() < f32::EPSILON);
    assert_eq!(config.settings.tick_jitter_ms, 100);
    assert_eq!(config.settings.preferred_locale, "en-US");
}

#[test]
fn flags_override_file() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, r#"{ "rate": 1.25, "volume": 0.5 }"#);

    let config = CliConfig::resolve(&parse(
        &path,
        &["--rate", "2", "--backend", "simulated"],
    ))
    .unwrap();

    assert!((config.settings.rate - 2.0).abs() < f32::EPSILON);
    assert!((config.settings.volume - 0.5).abs() < f32::EPSILON);
    assert_eq!(config.backend, BackendKind::Simulated);
}

#[test]
fn invalid_json_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "{ rate: fast }");

    let err = CliConfig::resolve(&parse(&path, &[])).unwrap_err();

    assert!(matches!(err, CliError::Config(_)));
    assert!(err.to_string().contains("avatar.json"));
}

#[test]
fn out_of_range_file_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, r#"{ "eye_change_probability": 1.5 }"#);

    let err = CliConfig::resolve(&parse(&path, &[])).unwrap_err();

    assert_eq!(err.exit_code(), 78);
}

#[test]
fn zero_tick_base_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, r#"{ "tick_base_ms": 0 }"#);

    assert!(CliConfig::resolve(&parse(&path, &[])).is_err());
}
