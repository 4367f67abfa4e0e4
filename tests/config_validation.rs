//! Tests for loading the warehouse configuration from the environment.

use std::collections::HashMap;

use strum::IntoEnumIterator;
use warehouse_export::config::EnvKey;
use warehouse_export::{ConfigError, ExportError, WarehouseConfig};

fn full_env() -> HashMap<&'static str, String> {
    HashMap::from([
        ("SNOWFLAKE_ACCOUNT", "myorg-acct01".to_string()),
        ("SNOWFLAKE_USER", "export_user".to_string()),
        ("SNOWFLAKE_ROLE", "REPORTER".to_string()),
        ("SNOWFLAKE_WAREHOUSE", "REPORT_WH".to_string()),
        ("SNOWFLAKE_DATABASE", "STOCKS_ELT_DB".to_string()),
        ("SNOWFLAKE_SCHEMA", "PREP".to_string()),
        ("SNOWFLAKE_PRIVATE_KEY_PATH", "/secrets/rsa_key.p8".to_string()),
    ])
}

fn load(env: &HashMap<&'static str, String>) -> Result<WarehouseConfig, ConfigError> {
    WarehouseConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn test_complete_environment_loads() {
    let config = load(&full_env()).expect("valid configuration");

    assert_eq!(config.warehouse, "REPORT_WH");
    assert_eq!(config.private_key_passphrase, None);
    assert_eq!(config.base_url(), "https://myorg-acct01.snowflakecomputing.com");
    assert_eq!(config.qualified_user(), "MYORG-ACCT01.EXPORT_USER");
}

#[test]
fn test_every_missing_key_is_listed() {
    let mut env = full_env();
    env.remove("SNOWFLAKE_ROLE");
    env.remove("SNOWFLAKE_PRIVATE_KEY_PATH");
    env.insert("SNOWFLAKE_SCHEMA", "   ".to_string());

    match load(&env) {
        Err(ConfigError::MissingKeys(keys)) => assert_eq!(
            keys,
            vec![
                "SNOWFLAKE_ROLE",
                "SNOWFLAKE_SCHEMA",
                "SNOWFLAKE_PRIVATE_KEY_PATH"
            ]
        ),
        other => panic!("expected missing keys, got {:?}", other),
    }
}

#[test]
fn test_empty_environment_lists_all_required_keys() {
    let err = WarehouseConfig::from_lookup(|_| None).unwrap_err();
    let required: Vec<&str> = EnvKey::iter()
        .filter(|k| k.is_required())
        .map(EnvKey::name)
        .collect();
    assert_eq!(required.len(), 7);

    let message = err.to_string();
    for key in required {
        assert!(message.contains(key), "{} missing from: {}", key, message);
    }
    assert!(!message.contains("PASSPHRASE"));
}

#[test]
fn test_passphrase_and_host_are_optional() {
    let mut env = full_env();
    env.insert("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE", " secret ".to_string());
    env.insert("SNOWFLAKE_HOST", "http://localhost:8080/".to_string());

    let config = load(&env).unwrap();

    assert_eq!(config.private_key_passphrase.as_deref(), Some(" secret "));
    assert_eq!(config.base_url(), "http://localhost:8080");
}

#[test]
fn test_host_without_scheme_is_rejected() {
    let mut env = full_env();
    env.insert("SNOWFLAKE_HOST", "localhost:8080".to_string());

    let err = load(&env).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidValue { key: "SNOWFLAKE_HOST", .. }));
}

#[test]
fn test_configuration_errors_exit_with_code_two() {
    let err = ExportError::from(WarehouseConfig::from_lookup(|_| None).unwrap_err());
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_debug_output_hides_passphrase() {
    let mut env = full_env();
    env.insert("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE", "hunter2".to_string());

    let config = load(&env).unwrap();

    assert!(!format!("{:?}", config).contains("hunter2"));
}
