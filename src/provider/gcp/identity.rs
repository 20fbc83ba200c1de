//! # Ambient Identity
//!
//! Default project discovery for GCP, used when no project is configured.
//!
//! Lookup order for [`DefaultIdentity`]:
//! 1. `GOOGLE_CLOUD_PROJECT`, `GCLOUD_PROJECT`, `CLOUDSDK_CORE_PROJECT`
//! 2. The GCE/GKE metadata server (`project/project-id`)

use crate::constants::{METADATA_PROJECT_ID_URL, PROJECT_ENV_VARS};
use crate::provider::AmbientIdentity;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// The metadata host does not resolve off-cloud; don't hang on it
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Project from well-known environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvironmentIdentity;

impl EnvironmentIdentity {
    /// First non-blank project variable, trimmed
    #[must_use]
    pub fn lookup(&self) -> Option<String> {
        PROJECT_ENV_VARS.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .inspect(|_| debug!("Default project taken from {}", var))
        })
    }
}

#[async_trait]
impl AmbientIdentity for EnvironmentIdentity {
    async fn default_namespace(&self) -> Result<Option<String>> {
        Ok(self.lookup())
    }
}

/// Project id reported by the GCE/GKE metadata server
#[derive(Debug, Clone)]
pub struct MetadataServerIdentity {
    http_client: Client,
    url: String,
}

impl MetadataServerIdentity {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Self::with_url(METADATA_PROJECT_ID_URL)
    }

    /// Query a different metadata endpoint (emulators, tests)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .context("Failed to create metadata HTTP client")?;
        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AmbientIdentity for MetadataServerIdentity {
    async fn default_namespace(&self) -> Result<Option<String>> {
        match self
            .http_client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let project = response
                    .text()
                    .await
                    .context("Failed to read project id from metadata server")?;
                let project = project.trim();
                if project.is_empty() {
                    return Ok(None);
                }
                info!("Using default project from metadata server: {}", project);
                Ok(Some(project.to_string()))
            }
            Ok(response) => {
                debug!("Metadata server returned status {}", response.status());
                Ok(None)
            }
            Err(e) => {
                debug!("Metadata server not available: {}", e);
                Ok(None)
            }
        }
    }
}

/// Environment first, then the metadata server
#[derive(Debug, Clone)]
pub struct DefaultIdentity {
    environment: EnvironmentIdentity,
    metadata: MetadataServerIdentity,
}

impl DefaultIdentity {
    /// # Errors
    /// Returns an error if the metadata HTTP client cannot be built
    pub fn new() -> Result<Self> {
        Ok(Self::with_metadata(MetadataServerIdentity::new()?))
    }

    /// Environment first, then the given metadata lookup
    #[must_use]
    pub fn with_metadata(metadata: MetadataServerIdentity) -> Self {
        Self {
            environment: EnvironmentIdentity,
            metadata,
        }
    }
}

#[async_trait]
impl AmbientIdentity for DefaultIdentity {
    async fn default_namespace(&self) -> Result<Option<String>> {
        if let Some(project) = self.environment.lookup() {
            return Ok(Some(project));
        }
        self.metadata.default_namespace().await
    }
}
