//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options rooted at `cwd` that never touch the real home directory.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.user_config_path = None;
    options
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = VaultConfig::load_from_str("{}").expect("config");
    assert_eq!(config, VaultConfig::default());
}

#[test]
fn parse_full_config() {
    let json5 = r#"{
        // comments are allowed in json5
        storage: { root: "/data/ctx", backup_dir: "snapshots" },
        retry: { max_attempts: 5, base_delay_ms: 20 },
        search: { default_limit: 10 },
    }"#;
    let config = VaultConfig::load_from_str(json5).expect("config");
    assert_eq!(config.storage.root.as_deref(), Some("/data/ctx"));
    assert_eq!(config.storage.backup_dir, "snapshots");
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay_ms, 20);
    assert_eq!(config.search.default_limit, 10);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = VaultConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
    assert!(msg.contains("unexpected"));
}

#[test]
fn rejects_wrong_field_type_with_path() {
    let err = VaultConfig::load_from_str(r#"{ retry: { max_attempts: "three" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("retry.max_attempts"));
}

#[test]
fn rejects_zero_attempts_and_unsafe_backup_dir() {
    let err = VaultConfig::load_from_str(r#"{ retry: { max_attempts: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("max_attempts"));

    let err = VaultConfig::load_from_str(r#"{ storage: { backup_dir: "../up" } }"#).unwrap_err();
    assert!(format!("{err}").contains("backup_dir"));

    let err = VaultConfig::load_from_str(r#"{ search: { default_limit: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("default_limit"));
}

#[test]
fn load_from_path_reads_file() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("custom.json5");
    write_json5(&path, "{ search: { default_limit: 7 } }");
    let config = VaultConfig::load_from_path(&path).expect("config");
    assert_eq!(config.search.default_limit, 7);
}

/// Ensure cwd config takes precedence over project and user config.
#[test]
fn layered_config_prefers_cwd_over_project_and_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        "{ retry: { max_attempts: 9, base_delay_ms: 1 } }",
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ retry: { max_attempts: 7 }, search: { default_limit: 11 } }",
    );
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ retry: { max_attempts: 4 } }");

    let mut options = isolated_options(&cwd);
    options.user_config_path = Some(user_config);

    let layered = VaultConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.retry.max_attempts, 4);
    assert_eq!(layered.config.retry.base_delay_ms, 1);
    assert_eq!(layered.config.search.default_limit, 11);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd
        ]
    );
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(cwd.join(".git")).expect("git");
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ search: { default_limit: 3 } }");

    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ search: { default_limit: 99 } }");

    let options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    let layered = VaultConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.search.default_limit, 99);
    // project root and cwd are the same file and load once
    assert_eq!(layered.layers.len(), 2);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = VaultConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(format!("{err}").contains("nope.json5"));
}

#[test]
fn invalid_layer_reports_layer_label() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ storage: { bogus: 1 } }");
    let err = VaultConfig::load_layered_with_options(isolated_options(cwd)).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("storage.bogus"));
    assert!(msg.contains("cwd("));
}

#[test]
fn malformed_json5_names_its_origin() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ retry: ");
    let err = VaultConfig::load_layered_with_options(isolated_options(cwd)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(format!("{err}").contains("cwd("));
}

#[test]
fn layer_source_labels() {
    assert_eq!(ConfigLayerSource::User.to_string(), "user");
    assert_eq!(ConfigLayerSource::Runtime.as_str(), "runtime");
}
