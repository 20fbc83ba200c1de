//! # Provider Modules
//!
//! Capability interfaces the store needs from a secret backend, plus the GCP
//! Secret Manager implementation.
//!
//! - [`SecretBackend`] lists the versions of a secret and fetches a payload
//!   by address.
//! - [`AmbientIdentity`] supplies a default project when none is configured.

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Lifecycle state of a secret version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    /// Retrievable
    Enabled,
    /// Payload kept but not retrievable
    Disabled,
    /// Payload gone
    Destroyed,
    /// `STATE_UNSPECIFIED` or any state this client does not know
    #[default]
    #[serde(other)]
    Unspecified,
}

impl VersionState {
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Enabled
    }
}

/// One version of a secret as reported by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersion {
    /// Version identifier, e.g. `"3"`
    pub version: String,
    /// Backend resource address used to fetch the payload
    pub address: String,
    pub state: VersionState,
    pub created_at: DateTime<Utc>,
}

/// Read-only secret backend
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// List every version of `secret_name` in `project`, in any state
    ///
    /// Fails with [`BackendError::NotFound`] if the secret does not exist.
    async fn list_versions(
        &self,
        project: &str,
        secret_name: &str,
    ) -> Result<Vec<SecretVersion>, BackendError>;

    /// Fetch the raw payload stored at a version address
    ///
    /// Fails with [`BackendError::NotFound`] if the address no longer resolves.
    async fn access_version(&self, address: &str) -> Result<Vec<u8>, BackendError>;
}

/// Source of the default project when none is given explicitly
#[async_trait]
pub trait AmbientIdentity: Send + Sync {
    /// The ambient project id, if one can be determined
    async fn default_namespace(&self) -> anyhow::Result<Option<String>>;
}

// Provider implementations
pub mod gcp;
