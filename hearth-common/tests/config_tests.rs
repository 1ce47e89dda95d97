//! Configuration loading and root folder resolution tests
//!
//! Tests that manipulate HEARTH_ROOT_FOLDER are marked #[serial] so they
//! do not race each other.

use hearth_common::config::{
    default_root_folder, write_toml_config, ConfigOrigin, HearthConfig, LoggingConfig,
    PollingConfig, ROOT_FOLDER_ENV,
};
use hearth_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = HearthConfig::default();
    assert_eq!(config.resolve_root_folder(None), default_root_folder());
}

#[test]
#[serial]
fn test_env_var_beats_config_file() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/hearth-env-root");

    let config = HearthConfig {
        root_folder: Some(PathBuf::from("/tmp/hearth-config-root")),
        ..HearthConfig::default()
    };
    assert_eq!(
        config.resolve_root_folder(None),
        PathBuf::from("/tmp/hearth-env-root")
    );
    // CLI still wins over the environment
    assert_eq!(
        config.resolve_root_folder(Some(Path::new("/tmp/hearth-cli-root"))),
        PathBuf::from("/tmp/hearth-cli-root")
    );

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_config_file_root_folder_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = HearthConfig {
        root_folder: Some(PathBuf::from("/tmp/hearth-config-root")),
        ..HearthConfig::default()
    };
    assert_eq!(
        config.resolve_root_folder(None),
        PathBuf::from("/tmp/hearth-config-root")
    );
    assert_eq!(
        config.session_store(None).path(),
        Path::new("/tmp/hearth-config-root/session.json")
    );
}

#[test]
fn test_load_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/hearth"

[polling]
interval_ms = 500

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = HearthConfig::load(Some(&path)).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/hearth")));
    assert_eq!(config.polling.interval_ms, 500);
    assert_eq!(config.polling.max_attempts, 30);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_with_origin_reports_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"trace\"\n").unwrap();

    let (config, origin) = HearthConfig::load_with_origin(Some(&path)).unwrap();
    assert_eq!(config.logging.level, "trace");
    assert_eq!(origin, ConfigOrigin::File(path));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_load_with_origin_reports_missing_default_file() {
    let temp_dir = TempDir::new().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let result = HearthConfig::load_with_origin(None);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    let (config, origin) = result.unwrap();
    assert_eq!(config, HearthConfig::default());
    assert_eq!(
        origin,
        ConfigOrigin::Defaults {
            expected: Some(temp_dir.path().join("hearth").join("config.toml")),
        }
    );
}

#[test]
fn test_load_missing_explicit_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = HearthConfig::load(Some(&temp_dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_load_malformed_file_is_toml_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[polling\ninterval_ms = ").unwrap();

    let err = HearthConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn test_write_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("hearth").join("config.toml");

    let config = HearthConfig {
        root_folder: Some(PathBuf::from("/home/family/hearth")),
        polling: PollingConfig {
            interval_ms: 1000,
            max_attempts: 12,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
        },
        ..HearthConfig::default()
    };

    write_toml_config(&config, &target).unwrap();
    assert!(target.exists());
    assert!(!target.with_file_name("config.toml.tmp").exists());

    let loaded = HearthConfig::load(Some(&target)).unwrap();
    assert_eq!(loaded, config);
}
