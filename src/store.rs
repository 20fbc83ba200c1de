//! # Secret Store
//!
//! Read-only, dictionary-style view of the secrets in one project.
//!
//! ```rust,no_run
//! use gcp_secrets::{SecretKey, SecretStore, SecretStoreConfig};
//!
//! # async fn example() -> gcp_secrets::Result<()> {
//! let store = SecretStore::from_config(SecretStoreConfig::from_env()).await?;
//! let api_key = store.get(&SecretKey::new("API_KEY")?).await?;
//! let previous = store.get(&SecretKey::versioned("API_KEY", "1")?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Values are cached per key, addresses per `(name, version)`. The two caches
//! expire independently after the configured TTL.

use crate::cache::TtlCache;
use crate::config::SecretStoreConfig;
use crate::constants::DEFAULT_CACHE_TTL_SECS;
use crate::error::{BackendError, Result, SecretStoreError};
use crate::key::SecretKey;
use crate::observability::metrics;
use crate::provider::gcp::{DefaultIdentity, SecretManagerRest};
use crate::provider::{AmbientIdentity, SecretBackend};
use crate::resolver::AddressResolver;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

/// Read-only secret accessor with optional TTL caching
pub struct SecretStore {
    resolver: AddressResolver,
    backend: Arc<dyn SecretBackend>,
    values: Option<Mutex<TtlCache<SecretKey, String>>>,
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("project", &self.resolver.project())
            .field("cache_enabled", &self.values.is_some())
            .finish_non_exhaustive()
    }
}

impl SecretStore {
    #[must_use]
    pub fn builder() -> SecretStoreBuilder {
        SecretStoreBuilder::default()
    }

    /// Wire the REST backend and default identity from configuration
    ///
    /// # Errors
    /// Returns [`SecretStoreError::Configuration`] if no project can be
    /// determined or a client cannot be built
    pub async fn from_config(config: SecretStoreConfig) -> Result<Self> {
        let backend = match &config.access_token {
            Some(token) => {
                SecretManagerRest::with_access_token(Some(config.endpoint.as_str()), token)
            }
            None => SecretManagerRest::new(Some(config.endpoint.as_str())),
        }
        .map_err(|err| SecretStoreError::Configuration(format!("{err:#}")))?;

        let mut builder = Self::builder()
            .backend(Arc::new(backend))
            .cache(config.cache_enabled)
            .cache_ttl(config.cache_ttl);
        if let Some(project) = config.project {
            builder = builder.project(project);
        }
        builder.build().await
    }

    /// Project the store reads from
    pub fn project(&self) -> &str {
        self.resolver.project()
    }

    pub fn cache_enabled(&self) -> bool {
        self.values.is_some()
    }

    /// Fetch and decode the secret value for `key`
    ///
    /// A bare name yields the latest enabled version. With caching on, the
    /// value of a bare name is also stored under `(name, "latest")`.
    ///
    /// # Errors
    /// - Any resolution error from [`AddressResolver::resolve`]
    /// - [`SecretStoreError::VersionNotFound`] if the version disappeared
    ///   between listing and access
    /// - [`SecretStoreError::Decode`] if the payload is not UTF-8
    pub async fn get(&self, key: &SecretKey) -> Result<String> {
        key.validate()?;

        let span = tracing::debug_span!("secret_store.get", secret.key = %key);
        async move {
            if let Some(value) = self.cached_value(key) {
                debug!("Value cache hit for {}", key);
                metrics::increment_cache_hit(metrics::VALUE_CACHE);
                return Ok(value);
            }
            if self.values.is_some() {
                metrics::increment_cache_miss(metrics::VALUE_CACHE);
            }

            let address = self.resolver.resolve(key.name(), key.version()).await?;
            let payload = self
                .backend
                .access_version(&address)
                .await
                .map_err(|err| match err {
                    BackendError::NotFound(_) => SecretStoreError::VersionNotFound {
                        name: key.name().to_string(),
                        version: key.version().to_string(),
                    },
                    BackendError::Transport(source) => SecretStoreError::Backend(source),
                })?;

            let value = String::from_utf8(payload).map_err(|source| SecretStoreError::Decode {
                name: key.name().to_string(),
                source,
            })?;

            self.store_value(key, &value);
            Ok(value)
        }
        .instrument(span)
        .await
    }

    /// Whether `key` resolves to an enabled version. Never fetches the value.
    ///
    /// Absence (`NotFound`, `NoActiveVersions`, `VersionNotFound`) is `false`.
    /// A malformed key is an error, not an absence.
    ///
    /// # Errors
    /// [`SecretStoreError::InvalidArgument`] and backend failures propagate
    pub async fn contains(&self, key: &SecretKey) -> Result<bool> {
        key.validate()?;
        match self.resolver.resolve(key.name(), key.version()).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => {
                debug!("{} not present: {}", key, err);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Enabled version ids of `name`, newest first
    ///
    /// # Errors
    /// Same as [`AddressResolver::list_active`]
    pub async fn versions(&self, name: &str) -> Result<Vec<String>> {
        let records = self.resolver.list_active(name).await?;
        Ok(records.into_iter().map(|record| record.version).collect())
    }

    /// The store is read-only; this always fails
    ///
    /// # Errors
    /// Always [`SecretStoreError::Unsupported`]
    pub fn set(&self, key: &SecretKey, _value: &str) -> Result<()> {
        debug!("Rejected write to {}", key);
        Err(SecretStoreError::Unsupported(
            "secret store is read-only; writes are not supported",
        ))
    }

    fn cached_value(&self, key: &SecretKey) -> Option<String> {
        let values = self.values.as_ref()?;
        let values = values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key, Instant::now())
    }

    fn store_value(&self, key: &SecretKey, value: &str) {
        let Some(values) = self.values.as_ref() else {
            return;
        };
        let now = Instant::now();
        let mut values = values.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(alias) = key.latest_alias() {
            values.insert(alias, value.to_string(), now);
        }
        values.insert(key.clone(), value.to_string(), now);
    }
}

/// Builder for [`SecretStore`]
pub struct SecretStoreBuilder {
    project: Option<String>,
    cache: bool,
    cache_ttl: Duration,
    backend: Option<Arc<dyn SecretBackend>>,
    identity: Option<Arc<dyn AmbientIdentity>>,
}

impl std::fmt::Debug for SecretStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStoreBuilder")
            .field("project", &self.project)
            .field("cache", &self.cache)
            .field("cache_ttl", &self.cache_ttl)
            .field("backend", &self.backend.is_some())
            .field("identity", &self.identity.is_some())
            .finish()
    }
}

impl Default for SecretStoreBuilder {
    fn default() -> Self {
        Self {
            project: None,
            cache: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            backend: None,
            identity: None,
        }
    }
}

impl SecretStoreBuilder {
    /// Explicit project; skips the ambient identity lookup
    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn SecretBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Identity consulted when no project is set. Defaults to [`DefaultIdentity`].
    #[must_use]
    pub fn identity(mut self, identity: Arc<dyn AmbientIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// # Errors
    /// - [`SecretStoreError::InvalidArgument`] for a blank explicit project or a zero TTL
    /// - [`SecretStoreError::Configuration`] if no backend is set or no project
    ///   can be determined
    pub async fn build(self) -> Result<SecretStore> {
        let backend = self.backend.ok_or_else(|| {
            SecretStoreError::Configuration("no secret backend configured".to_string())
        })?;
        if self.cache && self.cache_ttl.is_zero() {
            return Err(SecretStoreError::InvalidArgument(
                "cache TTL must be positive".to_string(),
            ));
        }

        let project = match self.project {
            Some(project) => {
                let project = project.trim();
                if project.is_empty() {
                    return Err(SecretStoreError::InvalidArgument(
                        "Project must be a non-empty string".to_string(),
                    ));
                }
                project.to_string()
            }
            None => {
                let identity: Arc<dyn AmbientIdentity> = match self.identity {
                    Some(identity) => identity,
                    None => Arc::new(
                        DefaultIdentity::new()
                            .map_err(|err| SecretStoreError::Configuration(format!("{err:#}")))?,
                    ),
                };
                default_project(identity.as_ref()).await?
            }
        };

        let cache_ttl = self.cache.then_some(self.cache_ttl);
        info!(
            "Secret store ready for project {} (cache: {})",
            project,
            cache_ttl.map_or_else(|| "off".to_string(), |ttl| format!("{}s", ttl.as_secs())),
        );

        Ok(SecretStore {
            resolver: AddressResolver::new(Arc::clone(&backend), project, cache_ttl),
            backend,
            values: cache_ttl.map(|ttl| Mutex::new(TtlCache::new(ttl))),
        })
    }
}

async fn default_project(identity: &dyn AmbientIdentity) -> Result<String> {
    let missing = || {
        SecretStoreError::Configuration(
            "No GCP project specified and none found in the environment or metadata server. \
             Provide a project explicitly or set GOOGLE_CLOUD_PROJECT"
                .to_string(),
        )
    };
    match identity.default_namespace().await {
        Ok(Some(project)) if !project.trim().is_empty() => Ok(project.trim().to_string()),
        Ok(_) => Err(missing()),
        Err(err) => Err(SecretStoreError::Configuration(format!(
            "default project lookup failed: {err:#}"
        ))),
    }
}
