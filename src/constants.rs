//! # Constants
//!
//! Shared constants used throughout the crate.
//!
//! These values represent reasonable defaults and can be overridden via
//! [`crate::config::SecretStoreConfig`] or environment variables where applicable.

/// Default time-to-live for address and value cache entries (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Version token that aliases the most recently created active version
pub const LATEST_VERSION: &str = "latest";

/// Maximum length of a secret name accepted by Secret Manager
pub const MAX_SECRET_NAME_LEN: usize = 255;

/// Production Secret Manager REST endpoint
pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Metadata server token endpoint (Workload Identity on GKE/GCE)
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Metadata server project id endpoint
pub const METADATA_PROJECT_ID_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/project/project-id";

/// Environment variables consulted (in order) for the default project
pub const PROJECT_ENV_VARS: [&str; 3] = [
    "GOOGLE_CLOUD_PROJECT",
    "GCLOUD_PROJECT",
    "CLOUDSDK_CORE_PROJECT",
];

/// Page size requested when listing secret versions
pub const LIST_VERSIONS_PAGE_SIZE: u32 = 250;
