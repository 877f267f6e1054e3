//! Unit tests for configuration and graceful degradation
//!
//! Tests that manipulate BIRDCLUB_ROOT_FOLDER are marked #[serial] so they
//! run sequentially, not in parallel.

use birdclub_common::config::{
    database_path, is_valid_key, load_toml_config,
    resolve_api_key, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_cli_argument_wins_over_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/from-cli")), &toml);
    assert_eq!(root, PathBuf::from("/tmp/from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_wins_over_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/tmp/from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_when_no_overrides() {
    env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &toml), PathBuf::from("/tmp/from-toml"));
}

#[test]
#[serial]
fn test_compiled_default_is_non_empty() {
    env::remove_var(ROOT_FOLDER_ENV);
    let root = resolve_root_folder(None, &TomlConfig::default());
    assert!(!root.as_os_str().is_empty());
    assert!(root.to_string_lossy().contains("birdclub"));
}

#[test]
fn test_database_path_inside_root() {
    assert_eq!(
        database_path(Path::new("/srv/club")),
        PathBuf::from("/srv/club/birdclub.db")
    );
}

#[test]
fn test_load_full_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/birdclub"
bind_address = "0.0.0.0:8080"

[logging]
level = "debug"

[ebird]
api_key = "abc123"

[events]
base_url = "https://cms.example.org/api"
api_key = "evkey"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/birdclub")));
    assert_eq!(config.bind_address.as_deref(), Some("0.0.0.0:8080"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.ebird.api_key.as_deref(), Some("abc123"));
    assert!(config.ebird.base_url.is_none());
    assert_eq!(config.events.base_url.as_deref(), Some("https://cms.example.org/api"));
}

#[test]
fn test_partial_toml_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "bind_address = \"127.0.0.1:9000\"\n").unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging, Default::default());
    assert!(config.root_folder.is_none());
}

#[test]
fn test_missing_or_broken_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("absent.toml");
    assert!(load_toml_config(&missing).is_err());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "this is = = not toml").unwrap();
    assert!(load_toml_config(&broken).is_err());
}

#[test]
fn test_api_key_resolution_priority() {
    assert!(!is_valid_key("   "));
    assert_eq!(
        resolve_api_key("ebird", Some("cli"), Some("toml")).as_deref(),
        Some("cli")
    );
    assert_eq!(
        resolve_api_key("ebird", Some("  "), Some(" toml ")).as_deref(),
        Some("toml")
    );
    assert!(resolve_api_key("ebird", None, Some("")).is_none());
}
