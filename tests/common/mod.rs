//! Common test utilities
//!
//! Provides rustls setup for the Pact tests and an in-memory secret backend
//! that records how often it is called.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use gcp_secrets::provider::{AmbientIdentity, SecretBackend, SecretVersion, VersionState};
use gcp_secrets::BackendError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Required for rustls 0.23+ when no default provider is set via features
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const PROJECT: &str = "test-project";

pub fn address(name: &str, version: &str) -> String {
    format!("projects/{PROJECT}/secrets/{name}/versions/{version}")
}

#[derive(Debug, Clone)]
struct StoredVersion {
    meta: SecretVersion,
    payload: Vec<u8>,
}

/// In-memory stand-in for Secret Manager
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    secrets: Mutex<HashMap<String, Vec<StoredVersion>>>,
    list_calls: AtomicUsize,
    access_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enabled version
    pub fn with_version(self, name: &str, version: &str, created_secs: i64, payload: &str) -> Self {
        self.with_version_state(
            name,
            version,
            created_secs,
            VersionState::Enabled,
            payload.as_bytes(),
        )
    }

    pub fn with_version_state(
        self,
        name: &str,
        version: &str,
        created_secs: i64,
        state: VersionState,
        payload: &[u8],
    ) -> Self {
        self.add_version(name, version, created_secs, state, payload);
        self
    }

    pub fn add_version(
        &self,
        name: &str,
        version: &str,
        created_secs: i64,
        state: VersionState,
        payload: &[u8],
    ) {
        let stored = StoredVersion {
            meta: SecretVersion {
                version: version.to_string(),
                address: address(name, version),
                state,
                created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
            },
            payload: payload.to_vec(),
        };
        self.secrets
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(stored);
    }

    /// Drop a version so its address no longer resolves
    pub fn remove_version(&self, name: &str, version: &str) {
        if let Some(versions) = self.secrets.lock().unwrap().get_mut(name) {
            versions.retain(|stored| stored.meta.version != version);
        }
    }

    /// Replace the payload of an existing version
    pub fn set_payload(&self, name: &str, version: &str, payload: &str) {
        let mut secrets = self.secrets.lock().unwrap();
        let stored = secrets
            .get_mut(name)
            .and_then(|versions| versions.iter_mut().find(|s| s.meta.version == version))
            .expect("version exists");
        stored.payload = payload.as_bytes().to_vec();
    }

    /// Make every call fail with a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn access_calls(&self) -> usize {
        self.access_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(BackendError::Transport(anyhow::anyhow!(
                "HTTP 503 (status: 503 Service Unavailable): backend unavailable"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SecretBackend for InMemoryBackend {
    async fn list_versions(
        &self,
        project: &str,
        secret_name: &str,
    ) -> Result<Vec<SecretVersion>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if project != PROJECT {
            return Err(BackendError::NotFound(format!("projects/{project}")));
        }
        self.secrets
            .lock()
            .unwrap()
            .get(secret_name)
            .map(|versions| versions.iter().map(|s| s.meta.clone()).collect())
            .ok_or_else(|| BackendError::NotFound(format!("projects/{project}/secrets/{secret_name}")))
    }

    async fn access_version(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.secrets
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|stored| stored.meta.address == address && stored.meta.state.is_active())
            .map(|stored| stored.payload.clone())
            .ok_or_else(|| BackendError::NotFound(address.to_string()))
    }
}

/// Identity returning a fixed answer
#[derive(Debug)]
pub struct FixedIdentity(pub Option<String>);

#[async_trait]
impl AmbientIdentity for FixedIdentity {
    async fn default_namespace(&self) -> anyhow::Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Identity whose lookup fails
#[derive(Debug)]
pub struct BrokenIdentity;

#[async_trait]
impl AmbientIdentity for BrokenIdentity {
    async fn default_namespace(&self) -> anyhow::Result<Option<String>> {
        Err(anyhow::anyhow!("credentials file is unreadable"))
    }
}
