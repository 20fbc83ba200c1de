//! # Address Resolver
//!
//! Maps `(name, version)` onto the backend address of a concrete secret
//! version.
//!
//! A miss lists every version of the secret once and caches an address for
//! each enabled version plus a `"latest"` alias, all under one lock and one
//! timestamp. "Latest" is the enabled version with the greatest creation
//! time, not the greatest version number. When two enabled versions share the
//! greatest creation time, which one is chosen is unspecified.

use crate::cache::TtlCache;
use crate::constants::LATEST_VERSION;
use crate::error::{BackendError, Result, SecretStoreError};
use crate::key::{validate_name, validate_version};
use crate::observability::metrics;
use crate::provider::SecretBackend;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

type AddressCache = TtlCache<(String, String), String>;

/// An enabled version of a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub version: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Resolves secret names and versions to backend addresses
pub struct AddressResolver {
    backend: Arc<dyn SecretBackend>,
    project: String,
    cache: Option<Mutex<AddressCache>>,
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("project", &self.project)
            .field("cache_enabled", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl AddressResolver {
    /// `cache_ttl` of `None` disables the address cache
    pub fn new(
        backend: Arc<dyn SecretBackend>,
        project: impl Into<String>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            project: project.into(),
            cache: cache_ttl.map(|ttl| Mutex::new(TtlCache::new(ttl))),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Resolve `(name, version)` to an address
    ///
    /// # Errors
    /// - [`SecretStoreError::InvalidArgument`] for a malformed name or version
    /// - [`SecretStoreError::NotFound`] if the secret does not exist
    /// - [`SecretStoreError::NoActiveVersions`] if no version is enabled
    /// - [`SecretStoreError::VersionNotFound`] if `version` is not an enabled version
    /// - [`SecretStoreError::Backend`] for any other backend failure
    pub async fn resolve(&self, name: &str, version: &str) -> Result<String> {
        validate_name(name)?;
        validate_version(version)?;

        if let Some(address) = self.cached(name, version) {
            debug!("Address cache hit for {}@{}", name, version);
            metrics::increment_cache_hit(metrics::ADDRESS_CACHE);
            return Ok(address);
        }
        if self.cache.is_some() {
            metrics::increment_cache_miss(metrics::ADDRESS_CACHE);
        }

        let records = self.list_active(name).await?;
        let record = if version == LATEST_VERSION {
            select_latest(&records)
        } else {
            records.iter().find(|record| record.version == version)
        };

        record
            .map(|record| record.address.clone())
            .ok_or_else(|| SecretStoreError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    /// List the enabled versions of `name`, newest first, refreshing the
    /// address cache on the way
    ///
    /// # Errors
    /// Same as [`AddressResolver::resolve`], except `VersionNotFound`
    pub async fn list_active(&self, name: &str) -> Result<Vec<VersionRecord>> {
        validate_name(name)?;

        let versions = self
            .backend
            .list_versions(&self.project, name)
            .await
            .map_err(|err| match err {
                BackendError::NotFound(_) => SecretStoreError::NotFound {
                    name: name.to_string(),
                    project: self.project.clone(),
                },
                BackendError::Transport(source) => SecretStoreError::Backend(source),
            })?;

        let mut records: Vec<VersionRecord> = versions
            .into_iter()
            .filter(|version| version.state.is_active())
            .map(|version| VersionRecord {
                version: version.version,
                address: version.address,
                created_at: version.created_at,
            })
            .collect();

        let Some(latest) = select_latest(&records).cloned() else {
            return Err(SecretStoreError::NoActiveVersions {
                name: name.to_string(),
                project: self.project.clone(),
            });
        };
        debug!(
            "Secret {} has {} active versions, latest is {}",
            name,
            records.len(),
            latest.version
        );

        self.populate(name, &records, &latest);

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn cached(&self, name: &str, version: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(&(name.to_string(), version.to_string()), Instant::now())
    }

    fn populate(&self, name: &str, records: &[VersionRecord], latest: &VersionRecord) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let now = Instant::now();
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            cache.insert(
                (name.to_string(), record.version.clone()),
                record.address.clone(),
                now,
            );
        }
        cache.insert(
            (name.to_string(), LATEST_VERSION.to_string()),
            latest.address.clone(),
            now,
        );
    }
}

/// Enabled version with the greatest creation time
pub fn select_latest(records: &[VersionRecord]) -> Option<&VersionRecord> {
    records.iter().max_by_key(|record| record.created_at)
}
