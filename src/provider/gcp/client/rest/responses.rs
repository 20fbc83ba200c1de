//! # Response Types
//!
//! GCP Secret Manager REST API response structures.
//!
//! These structs represent the JSON payloads returned by the GCP Secret Manager REST API v1.
//! They are designed to match the API schema as documented at:
//! https://cloud.google.com/secret-manager/docs/reference/rest

use crate::provider::gcp::client::common::version_id_from_address;
use crate::provider::{SecretVersion, VersionState};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page of `GET /v1/projects/{project}/secrets/{secret}/versions`
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSecretVersionsResponse {
    /// Versions on this page. Omitted entirely when the secret has none.
    #[serde(default)]
    pub versions: Vec<SecretVersionResource>,
    /// Token for the next page, absent or empty on the last page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Secret version metadata (no payload)
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions#SecretVersion
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersionResource {
    /// `projects/*/secrets/*/versions/*`
    pub name: String,
    /// RFC 3339 creation timestamp
    pub create_time: DateTime<Utc>,
    #[serde(default)]
    pub state: VersionState,
}

impl From<SecretVersionResource> for SecretVersion {
    fn from(resource: SecretVersionResource) -> Self {
        Self {
            version: version_id_from_address(&resource.name).to_string(),
            state: resource.state,
            created_at: resource.create_time,
            address: resource.name,
        }
    }
}

/// Secret payload containing the actual secret data
///
/// **Important**: The `data` field is base64-encoded and must be decoded
/// to retrieve the original value.
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/SecretPayload
#[derive(Debug, Deserialize)]
pub struct SecretPayload {
    /// Base64-encoded secret data
    #[serde(default)]
    pub data: String,
}

/// Response from accessing a secret version
///
/// Returned by `GET /v1/projects/{project}/secrets/{secret}/versions/{version}:access`
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions/access
#[derive(Debug, Deserialize)]
pub struct AccessSecretVersionResponse {
    /// The resource name of the secret version
    #[allow(dead_code, reason = "Required for deserialization but not used")]
    pub name: String,
    pub payload: SecretPayload,
}

/// GCP API error response wrapper
///
/// API Reference: https://cloud.google.com/apis/design/errors
#[derive(Debug, Deserialize)]
pub struct GcpErrorResponse {
    /// Error details
    pub error: GcpError,
}

/// Detailed error information from GCP API
#[derive(Debug, Deserialize)]
pub struct GcpError {
    /// HTTP status code (e.g., 404, 403, 500)
    pub code: u16,
    /// Human-readable error message
    pub message: String,
    /// Error status string (e.g., "NOT_FOUND", "PERMISSION_DENIED")
    pub status: String,
}

/// OAuth2 access token response from GCP metadata server
///
/// Endpoint: `http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token`
///
/// API Reference: https://cloud.google.com/compute/docs/metadata/querying-metadata
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// OAuth2 access token for authenticating with GCP APIs
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}
