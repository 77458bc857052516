//! Integration tests for configuration driven registries.
//!
//! These tests verify that levels, channels, explicit default handlers and
//! the default channel are applied from configuration, and that malformed
//! handler descriptions are rejected.

use std::fs;
use std::sync::Arc;

use logbook::{Error, Log, LogManager, ManagerConfig};
use logging::{Context, Level};
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// Applying Configuration
// ============================================================================

/// Levels, channels and the default are all applied.
#[test]
fn full_configuration_is_applied() {
    let dir = tempdir().unwrap();
    let config = ManagerConfig::from_value(json!({
        "default_storage_path": dir.path(),
        "levels": { "AUDIT": 260 },
        "channels": {
            "orders": { "rotate": 3, "level": "audit", "format": "%level_name% %message%" },
            "quiet": { "handlers": [ { "type": "null" } ] }
        },
        "default": "orders"
    }))
    .unwrap();

    let manager = LogManager::from_config(config).unwrap();
    assert_eq!(manager.channel_names(), vec!["orders".to_owned(), "quiet".to_owned()]);
    assert_eq!(manager.levels().resolve_name("audit").unwrap(), Level::new(260));

    let default = manager.get_default();
    assert_eq!(default.name(), "orders");
    assert_eq!(default.params("rotate", json!(null)), json!(3));

    manager.notice("skipped", Context::new()).unwrap();
    manager.log(&json!("audit"), "recorded", Context::new()).unwrap();
    manager.flush().unwrap();

    let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
    let content = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
    assert_eq!(content, "AUDIT recorded\n");
}

/// Explicit handlers replace the rotating file fallback.
#[test]
fn configured_handlers_replace_fallback() {
    let dir = tempdir().unwrap();
    let manager = LogManager::from_json_str(&format!(
        r#"{{
            "default_storage_path": {path},
            "channels": {{
                "console": {{ "handlers": [ {{ "type": "null", "level": "error" }} ] }}
            }}
        }}"#,
        path = json!(dir.path())
    ))
    .unwrap();

    let console = manager.channel(Some("console")).unwrap();
    assert_eq!(console.default_handlers().len(), 1);
    assert!(console.param("handlers").is_none());

    console.error("discarded", Context::new()).unwrap();
    assert_eq!(console.handlers()[0].kind(), "null");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// Rotating file handlers without a filename use the storage path.
#[test]
fn configured_rotating_file_uses_storage_path() {
    let dir = tempdir().unwrap();
    let manager = LogManager::from_config(
        ManagerConfig::from_value(json!({
            "default_storage_path": dir.path(),
            "channels": {
                "jobs": {
                    "handlers": [
                        { "type": "rotating_file", "max_files": 2, "format": "%message%" }
                    ]
                }
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let jobs = manager.channel(Some("jobs")).unwrap();
    jobs.info("ran", Context::new()).unwrap();
    jobs.flush().unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("jobs-"));
}

/// A configured channel named "default" is kept as the default channel.
#[test]
fn configured_default_channel_is_kept() {
    let dir = tempdir().unwrap();
    let custom = dir.path().join("custom.log");
    let manager = LogManager::from_config(
        ManagerConfig::from_value(json!({
            "channels": { "default": { "filename": custom, "format": "%message%" } }
        }))
        .unwrap(),
    )
    .unwrap();

    let registered = manager.channel(Some("default")).unwrap();
    assert!(Arc::ptr_eq(&registered, &manager.get_default()));
    assert_eq!(manager.get_default().param("filename"), Some(json!(custom)));

    manager.info("kept", Context::new()).unwrap();
    manager.flush().unwrap();

    let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
    let content = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
    assert_eq!(content, "kept\n");
}

/// An explicit `default` key wins over a channel named "default".
#[test]
fn explicit_default_wins_over_default_name() {
    let manager = LogManager::from_json_str(
        r#"{"channels": {"default": {}, "app": {}}, "default": "app"}"#,
    )
    .unwrap();

    assert_eq!(manager.get_default().name(), "app");
    assert!(manager.has_channel("default"));
}

/// An empty configuration yields an empty registry.
#[test]
fn empty_configuration() {
    let manager = LogManager::from_json_str("{}").unwrap();
    assert!(manager.channel_names().is_empty());
    assert_eq!(manager.default_storage_path(), None);
    assert!(Arc::ptr_eq(&manager.get_default(), &manager.channel(None).unwrap()));
}

// ============================================================================
// Rejected Configuration
// ============================================================================

/// Unknown handler types are reported with the offending description.
#[test]
fn unknown_handler_type_is_rejected() {
    let error = LogManager::from_config(
        ManagerConfig::from_value(json!({
            "channels": { "app": { "handlers": [ { "type": "syslog", "ident": "app" } ] } }
        }))
        .unwrap(),
    )
    .unwrap_err();

    match error {
        Error::InvalidHandlerType { channel, found } => {
            assert_eq!(channel, "app");
            assert!(found.contains("syslog"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

/// A `handlers` value that is not a list is rejected.
#[test]
fn non_list_handlers_are_rejected() {
    let error =
        LogManager::from_json_str(r#"{"channels": {"app": {"handlers": "stderr"}}}"#).unwrap_err();
    assert!(matches!(error, Error::InvalidHandlerType { .. }));
}

/// Selecting an unregistered default fails.
#[test]
fn unknown_default_is_rejected() {
    let error = LogManager::from_json_str(r#"{"default": "missing"}"#).unwrap_err();
    assert!(matches!(error, Error::ChannelNotFound { ref name } if name == "missing"));
}

/// Renumbering a base level fails.
#[test]
fn reserved_level_is_rejected() {
    let error = LogManager::from_json_str(r#"{"levels": {"ERROR": 401}}"#).unwrap_err();
    assert!(matches!(error, Error::Level(logging::LevelError::Reserved { .. })));
}

/// Malformed JSON is a configuration error.
#[test]
fn malformed_json_is_rejected() {
    let error = LogManager::from_json_str("{ not json").unwrap_err();
    assert!(matches!(error, Error::Config(_)));
}
