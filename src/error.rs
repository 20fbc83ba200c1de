//! # Errors
//!
//! Error taxonomy for secret resolution and retrieval.
//!
//! `contains` relies on [`SecretStoreError::is_not_found`] to turn absence into
//! `false` while still surfacing malformed input and transport failures.

use thiserror::Error;

/// Errors returned by [`crate::SecretStore`] and [`crate::AddressResolver`]
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// Malformed key, name or version. Caller error, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No project could be determined at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The secret does not exist in the project
    #[error("Secret '{name}' not found in project '{project}'")]
    NotFound { name: String, project: String },

    /// The secret exists but has no enabled versions
    #[error("Secret '{name}' has no active versions in project '{project}'")]
    NoActiveVersions { name: String, project: String },

    /// The requested version is not among the enabled versions
    #[error("Version '{version}' of secret '{name}' not found among active versions")]
    VersionNotFound { name: String, version: String },

    /// The payload is not valid UTF-8
    #[error("Secret '{name}' payload is not valid UTF-8")]
    Decode {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Write attempted against the read-only store
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Backend failure that is not an absence (transport, auth, unexpected response)
    #[error("backend error: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl SecretStoreError {
    /// True for the failures that mean "nothing to fetch here"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NoActiveVersions { .. } | Self::VersionNotFound { .. }
        )
    }
}

/// Errors returned by a [`crate::provider::SecretBackend`]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The secret (for listing) or the version address (for access) does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other failure reaching or interpreting the backend
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

pub type Result<T, E = SecretStoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_class() {
        let not_found = SecretStoreError::NotFound {
            name: "a".to_string(),
            project: "p".to_string(),
        };
        let no_active = SecretStoreError::NoActiveVersions {
            name: "a".to_string(),
            project: "p".to_string(),
        };
        let no_version = SecretStoreError::VersionNotFound {
            name: "a".to_string(),
            version: "9".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(no_active.is_not_found());
        assert!(no_version.is_not_found());

        assert!(!SecretStoreError::InvalidArgument("bad".to_string()).is_not_found());
        assert!(!SecretStoreError::Unsupported("set").is_not_found());
        assert!(!SecretStoreError::Backend(anyhow::anyhow!("boom")).is_not_found());
    }

    #[test]
    fn test_not_found_message_names_secret_and_project() {
        let err = SecretStoreError::NotFound {
            name: "nonexistent".to_string(),
            project: "test-project".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Secret 'nonexistent' not found in project 'test-project'"
        );
    }
}
