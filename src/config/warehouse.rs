//! Warehouse connection configuration.
//!
//! The configuration is read from environment variables once at startup and
//! validated as a whole, so a misconfigured environment reports every missing
//! key in one error instead of failing on the first.

use std::fmt;
use std::path::PathBuf;

use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::error_handling::ConfigError;

/// Environment variables understood by [`WarehouseConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum EnvKey {
    /// Account identifier (e.g. `ORG-ACCOUNT` or a locator with region)
    #[strum(serialize = "SNOWFLAKE_ACCOUNT")]
    Account,
    /// Login name of the service user
    #[strum(serialize = "SNOWFLAKE_USER")]
    User,
    /// Role for the session
    #[strum(serialize = "SNOWFLAKE_ROLE")]
    Role,
    /// Virtual warehouse that executes the queries
    #[strum(serialize = "SNOWFLAKE_WAREHOUSE")]
    Warehouse,
    /// Default database
    #[strum(serialize = "SNOWFLAKE_DATABASE")]
    Database,
    /// Default schema
    #[strum(serialize = "SNOWFLAKE_SCHEMA")]
    Schema,
    /// Path to the PKCS#8 PEM private key
    #[strum(serialize = "SNOWFLAKE_PRIVATE_KEY_PATH")]
    PrivateKeyPath,
    /// Passphrase for an encrypted private key (optional)
    #[strum(serialize = "SNOWFLAKE_PRIVATE_KEY_PASSPHRASE")]
    PrivateKeyPassphrase,
    /// Base URL override for the SQL API (optional)
    #[strum(serialize = "SNOWFLAKE_HOST")]
    Host,
}

impl EnvKey {
    /// Environment variable name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether the job cannot start without this key.
    pub fn is_required(self) -> bool {
        !matches!(self, EnvKey::PrivateKeyPassphrase | EnvKey::Host)
    }
}

/// Validated warehouse configuration.
#[derive(Clone)]
pub struct WarehouseConfig {
    /// Account identifier
    pub account: String,
    /// Login name
    pub user: String,
    /// Session role
    pub role: String,
    /// Virtual warehouse
    pub warehouse: String,
    /// Default database
    pub database: String,
    /// Default schema
    pub schema: String,
    /// Path to the PKCS#8 PEM private key
    pub private_key_path: PathBuf,
    /// Passphrase for an encrypted key; `None` means the key is unencrypted
    pub private_key_passphrase: Option<String>,
    /// SQL API base URL override
    pub host: Option<String>,
}

impl WarehouseConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKeys` listing every required variable that
    /// is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: EnvKey| {
            lookup(key.name())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = EnvKey::iter()
            .filter(|key| key.is_required() && get(*key).is_none())
            .map(EnvKey::name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        let required = |key: EnvKey| get(key).unwrap_or_default();
        let host = get(EnvKey::Host);
        if let Some(host) = &host {
            if !host.starts_with("http://") && !host.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    key: EnvKey::Host.name(),
                    message: format!("'{}' must start with http:// or https://", host),
                });
            }
        }

        Ok(Self {
            account: required(EnvKey::Account),
            user: required(EnvKey::User),
            role: required(EnvKey::Role),
            warehouse: required(EnvKey::Warehouse),
            database: required(EnvKey::Database),
            schema: required(EnvKey::Schema),
            private_key_path: PathBuf::from(required(EnvKey::PrivateKeyPath)),
            // Passphrases are used verbatim; only an entirely blank one counts as unset.
            private_key_passphrase: lookup(EnvKey::PrivateKeyPassphrase.name())
                .filter(|v| !v.trim().is_empty()),
            host,
        })
    }

    /// Base URL of the SQL API, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.snowflakecomputing.com",
                self.account.to_lowercase().replace('_', "-")
            ),
        }
    }

    /// Account identifier as it appears in key-pair JWT claims.
    ///
    /// Upper-cased, with any region/cloud suffix of a legacy locator removed.
    pub fn account_identifier(&self) -> String {
        self.account
            .split('.')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }

    /// Qualified user name (`ACCOUNT.USER`) used as the JWT subject.
    pub fn qualified_user(&self) -> String {
        format!("{}.{}", self.account_identifier(), self.user.to_uppercase())
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("role", &self.role)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_passphrase",
                &self.private_key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("host", &self.host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        EnvKey::iter()
            .filter(|k| k.is_required())
            .map(|k| (k.name(), format!("value-{}", k.name().to_lowercase())))
            .collect()
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<WarehouseConfig, ConfigError> {
        WarehouseConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_from_lookup_enumerates_all_missing_keys() {
        let env = HashMap::new();
        match load(&env) {
            Err(ConfigError::MissingKeys(keys)) => {
                assert_eq!(
                    keys,
                    vec![
                        "SNOWFLAKE_ACCOUNT",
                        "SNOWFLAKE_USER",
                        "SNOWFLAKE_ROLE",
                        "SNOWFLAKE_WAREHOUSE",
                        "SNOWFLAKE_DATABASE",
                        "SNOWFLAKE_SCHEMA",
                        "SNOWFLAKE_PRIVATE_KEY_PATH",
                    ]
                );
            }
            other => panic!("expected MissingKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_ROLE", "   ".to_string());
        env.remove("SNOWFLAKE_SCHEMA");
        match load(&env) {
            Err(ConfigError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["SNOWFLAKE_ROLE", "SNOWFLAKE_SCHEMA"]);
            }
            other => panic!("expected MissingKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_keys_are_not_required() {
        let config = load(&full_env()).expect("complete environment");
        assert!(config.private_key_passphrase.is_none());
        assert!(config.host.is_none());
        assert_eq!(
            config.private_key_path,
            PathBuf::from("value-snowflake_private_key_path")
        );
    }

    #[test]
    fn test_passphrase_is_kept_verbatim() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE", " secret ".to_string());
        let config = load(&env).expect("complete environment");
        assert_eq!(config.private_key_passphrase.as_deref(), Some(" secret "));
    }

    #[test]
    fn test_base_url_defaults_to_account_host() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_ACCOUNT", "MyOrg-My_Account".to_string());
        let config = load(&env).expect("complete environment");
        assert_eq!(
            config.base_url(),
            "https://myorg-my-account.snowflakecomputing.com"
        );
    }

    #[test]
    fn test_base_url_honours_host_override() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_HOST", "http://127.0.0.1:8080/".to_string());
        let config = load(&env).expect("complete environment");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_host_override_must_be_a_url() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_HOST", "example.com".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidValue {
                key: "SNOWFLAKE_HOST",
                ..
            })
        ));
    }

    #[test]
    fn test_account_identifier_strips_region() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_ACCOUNT", "xy12345.us-east-2.aws".to_string());
        env.insert("SNOWFLAKE_USER", "etl_user".to_string());
        let config = load(&env).expect("complete environment");
        assert_eq!(config.account_identifier(), "XY12345");
        assert_eq!(config.qualified_user(), "XY12345.ETL_USER");
    }

    #[test]
    fn test_debug_redacts_passphrase() {
        let mut env = full_env();
        env.insert("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE", "hunter2".to_string());
        let config = load(&env).expect("complete environment");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
