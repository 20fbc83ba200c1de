//! # Store Configuration
//!
//! Settings for [`crate::SecretStore::from_config`], loaded from environment
//! variables with defaults.

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_SECRET_MANAGER_ENDPOINT};
use std::time::Duration;
use tracing::warn;

/// Store configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Clone)]
pub struct SecretStoreConfig {
    /// Project holding the secrets. `None` means ask the ambient identity.
    pub project: Option<String>,
    /// Cache resolved addresses and decoded values
    pub cache_enabled: bool,
    /// Lifetime of each cache entry
    pub cache_ttl: Duration,
    /// Secret Manager REST endpoint (emulators, Pact mock servers)
    pub endpoint: String,
    /// Fixed bearer token. `None` uses the metadata server.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for SecretStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStoreConfig")
            .field("project", &self.project)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_ttl", &self.cache_ttl)
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            project: None,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            endpoint: DEFAULT_SECRET_MANAGER_ENDPOINT.to_string(),
            access_token: None,
        }
    }
}

impl SecretStoreConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// - `GCP_SECRETS_PROJECT`
    /// - `GCP_SECRETS_CACHE` (true/false)
    /// - `GCP_SECRETS_CACHE_TTL_SECS`
    /// - `GCP_SECRET_MANAGER_ENDPOINT`
    /// - `GCP_SECRETS_ACCESS_TOKEN`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            project: env_var_non_empty("GCP_SECRETS_PROJECT"),
            cache_enabled: env_var_or_default_bool("GCP_SECRETS_CACHE", true),
            cache_ttl: Duration::from_secs(env_var_or_default(
                "GCP_SECRETS_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            endpoint: env_var_non_empty("GCP_SECRET_MANAGER_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SECRET_MANAGER_ENDPOINT.to_string()),
            access_token: env_var_non_empty("GCP_SECRETS_ACCESS_TOKEN"),
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}, using default", key, value);
            default
        }),
        Err(_) => default,
    }
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                warn!("Ignoring unparseable {}={:?}, using default", key, value);
                default
            }
        },
        Err(_) => default,
    }
}

/// Read environment variable, treating blank as unset
fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SecretStoreConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.endpoint, "https://secretmanager.googleapis.com");
        assert!(config.project.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SecretStoreConfig {
            access_token: Some("ya29.secret".to_string()),
            ..SecretStoreConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ya29"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_from_env_reads_every_variable() {
        std::env::set_var("GCP_SECRETS_PROJECT", "  env-project ");
        std::env::set_var("GCP_SECRETS_CACHE", "false");
        std::env::set_var("GCP_SECRETS_CACHE_TTL_SECS", "5");
        std::env::set_var("GCP_SECRET_MANAGER_ENDPOINT", "http://localhost:8085");
        std::env::set_var("GCP_SECRETS_ACCESS_TOKEN", "ya29.token");

        let config = SecretStoreConfig::from_env();

        for key in [
            "GCP_SECRETS_PROJECT",
            "GCP_SECRETS_CACHE",
            "GCP_SECRETS_CACHE_TTL_SECS",
            "GCP_SECRET_MANAGER_ENDPOINT",
            "GCP_SECRETS_ACCESS_TOKEN",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(config.project.as_deref(), Some("env-project"));
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.endpoint, "http://localhost:8085");
        assert_eq!(config.access_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        std::env::set_var("GCP_SECRETS_TEST_BAD_NUMBER", "abc");
        std::env::set_var("GCP_SECRETS_TEST_BAD_BOOL", "maybe");
        std::env::set_var("GCP_SECRETS_TEST_BLANK", "   ");

        assert_eq!(env_var_or_default("GCP_SECRETS_TEST_BAD_NUMBER", 300u64), 300);
        assert!(env_var_or_default_bool("GCP_SECRETS_TEST_BAD_BOOL", true));
        assert!(!env_var_or_default_bool("GCP_SECRETS_TEST_BAD_BOOL", false));
        assert_eq!(env_var_non_empty("GCP_SECRETS_TEST_BLANK"), None);

        std::env::set_var("GCP_SECRETS_TEST_BOOL_ON", " Yes ");
        assert!(env_var_or_default_bool("GCP_SECRETS_TEST_BOOL_ON", false));
    }

    #[test]
    fn test_missing_env_vars_fall_back() {
        assert_eq!(
            env_var_or_default("GCP_SECRETS_TEST_UNSET_NUMBER", 42u64),
            42
        );
        assert!(env_var_or_default_bool("GCP_SECRETS_TEST_UNSET_BOOL", true));
        assert_eq!(env_var_non_empty("GCP_SECRETS_TEST_UNSET_STR"), None);
    }
}
