//! GCP Secret Manager REST Client
//!
//! Native REST implementation for GCP Secret Manager API v1.
//! Uses reqwest for HTTP requests and OAuth2 bearer tokens for authentication.
//!
//! This implementation:
//! - Works directly with Pact HTTP mock servers
//! - Uses reqwest with rustls (no OpenSSL dependencies)
//! - Only issues read calls (list versions, access version)
//!
//! References:
//! - [GCP Secret Manager REST API v1](https://docs.cloud.google.com/secret-manager/docs/reference/rest)

mod operations;
mod responses;

pub use responses::*;

use crate::constants::{DEFAULT_SECRET_MANAGER_ENDPOINT, METADATA_TOKEN_URL};
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Refresh metadata-server tokens this long before they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Where the bearer token comes from
enum TokenSource {
    /// Fixed token supplied by the caller
    Static(String),
    /// GKE/GCE metadata server, refreshed when close to expiry
    MetadataServer(Mutex<Option<CachedToken>>),
}

struct CachedToken {
    header: String,
    expires_at: Instant,
}

/// GCP Secret Manager REST client
pub struct SecretManagerRest {
    http_client: Client,
    base_url: String,
    token: TokenSource,
}

impl std::fmt::Debug for SecretManagerRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token_source = match self.token {
            TokenSource::Static(_) => "static",
            TokenSource::MetadataServer(_) => "metadata-server",
        };
        f.debug_struct("SecretManagerRest")
            .field("base_url", &self.base_url)
            .field("token_source", &token_source)
            .finish_non_exhaustive()
    }
}

impl SecretManagerRest {
    /// Create a client that authenticates through the metadata server
    /// (Workload Identity)
    ///
    /// The first token is fetched lazily on the first request.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoint: Option<&str>) -> Result<Self> {
        info!("Using Workload Identity authentication (metadata server token)");
        Self::with_source(endpoint, TokenSource::MetadataServer(Mutex::new(None)))
    }

    /// Create a client that sends a fixed bearer token
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_access_token(endpoint: Option<&str>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_source(endpoint, TokenSource::Static(access_token.into()))
    }

    fn with_source(endpoint: Option<&str>, token: TokenSource) -> Result<Self> {
        let base_url = endpoint
            .unwrap_or(DEFAULT_SECRET_MANAGER_ENDPOINT)
            .trim_end_matches('/')
            .to_string();
        info!("Initializing GCP REST client for endpoint: {}", base_url);

        // Create HTTP client with rustls (already configured in Cargo.toml)
        let http_client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    /// Authorization header value for the next request
    pub(crate) async fn authorization(&self) -> Result<String> {
        match &self.token {
            TokenSource::Static(token) => Ok(bearer(token)),
            TokenSource::MetadataServer(cached) => {
                let mut cached = cached.lock().await;
                if let Some(token) = cached.as_ref() {
                    if Instant::now() < token.expires_at {
                        return Ok(token.header.clone());
                    }
                    debug!("Cached access token expired, refreshing");
                }
                let fresh = self.fetch_metadata_token().await?;
                let header = fresh.header.clone();
                *cached = Some(fresh);
                Ok(header)
            }
        }
    }

    /// Get OAuth2 access token from the metadata server
    async fn fetch_metadata_token(&self) -> Result<CachedToken> {
        match self
            .http_client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let token_response: TokenResponse = response
                    .json()
                    .await
                    .context("Failed to parse token response from metadata server")?;
                info!("Retrieved access token from metadata server (Workload Identity)");
                let lifetime = Duration::from_secs(token_response.expires_in)
                    .saturating_sub(TOKEN_EXPIRY_MARGIN);
                return Ok(CachedToken {
                    header: bearer(&token_response.access_token),
                    expires_at: Instant::now() + lifetime,
                });
            }
            Ok(response) => {
                debug!(
                    "Metadata server returned status {}: {}",
                    response.status(),
                    response.text().await.unwrap_or_default()
                );
            }
            Err(e) => {
                debug!("Metadata server not available: {}", e);
            }
        }

        if let Ok(credentials_path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            warn!(
                "Service account JSON authentication is not supported. \
                GOOGLE_APPLICATION_CREDENTIALS={} is set but will be ignored. \
                Use Workload Identity or supply an access token explicitly.",
                credentials_path
            );
        }

        Err(anyhow::anyhow!(
            "Failed to get access token. Ensure:\n\
            1. Running in GKE/GCE with Workload Identity enabled, OR\n\
            2. An access token is configured (GCP_SECRETS_ACCESS_TOKEN)"
        ))
    }

    /// Build an authenticated GET request for a `projects/...` resource path
    pub(crate) fn make_request(&self, path: &str, authorization: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}/v1/{}", self.base_url, path))
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
    }

    /// Turn a GCP API error response into an error
    pub(crate) fn handle_error_response(
        &self,
        status: reqwest::StatusCode,
        error_text: &str,
    ) -> anyhow::Error {
        // Try to parse GCP error response
        if let Ok(error_response) = serde_json::from_str::<GcpErrorResponse>(error_text) {
            anyhow::anyhow!(
                "GCP API error: {} (code: {}, status: {})",
                error_response.error.message,
                error_response.error.code,
                error_response.error.status
            )
        } else {
            // Include status code in error message for easier matching in tests
            anyhow::anyhow!(
                "HTTP {} (status: {}): {}",
                status.as_u16(),
                status,
                error_text
            )
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Format authorization header: add "Bearer " prefix if not already present
fn bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_prefix_added_once() {
        assert_eq!(bearer("abc"), "Bearer abc");
        assert_eq!(bearer("Bearer abc"), "Bearer abc");
    }

    #[test]
    fn test_base_url_defaults_and_trims() {
        let client = SecretManagerRest::with_access_token(None, "t").unwrap();
        assert_eq!(client.base_url(), "https://secretmanager.googleapis.com");

        let client = SecretManagerRest::with_access_token(Some("http://localhost:1234/"), "t").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }

    #[test]
    fn test_request_url_is_built_under_v1() {
        let client = SecretManagerRest::with_access_token(Some("http://localhost:1234/"), "t").unwrap();
        let request = client
            .make_request("projects/p/secrets/s/versions/2:access", "Bearer t")
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:1234/v1/projects/p/secrets/s/versions/2:access"
        );
        assert_eq!(request.headers()["authorization"], "Bearer t");
    }

    #[tokio::test]
    async fn test_static_token_authorization() {
        let client = SecretManagerRest::with_access_token(None, "test-token").unwrap();
        assert_eq!(client.authorization().await.unwrap(), "Bearer test-token");
    }

    #[test]
    fn test_error_response_parsing() {
        let client = SecretManagerRest::with_access_token(None, "t").unwrap();
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        let err = client.handle_error_response(reqwest::StatusCode::FORBIDDEN, body);
        assert_eq!(
            err.to_string(),
            "GCP API error: Permission denied (code: 403, status: PERMISSION_DENIED)"
        );

        let err = client.handle_error_response(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(err.to_string().starts_with("HTTP 502"));
    }
}
