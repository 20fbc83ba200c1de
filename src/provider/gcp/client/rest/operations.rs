//! # Read Operations
//!
//! Implementation of [`SecretBackend`] for the GCP Secret Manager REST API.

use crate::constants::LIST_VERSIONS_PAGE_SIZE;
use crate::error::BackendError;
use crate::provider::gcp::client::common::{
    format_access_path, format_versions_path, OperationTracker,
};
use crate::provider::gcp::client::rest::SecretManagerRest;
use crate::provider::{SecretBackend, SecretVersion};
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use tracing::{debug, field, Instrument};

use super::responses::{AccessSecretVersionResponse, ListSecretVersionsResponse};

#[async_trait]
impl SecretBackend for SecretManagerRest {
    async fn list_versions(
        &self,
        project: &str,
        secret_name: &str,
    ) -> Result<Vec<SecretVersion>, BackendError> {
        let span = tracing::debug_span!(
            "gcp.secret.list_versions",
            secret.name = secret_name,
            project.id = project,
            operation.success = field::Empty,
            operation.found = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new("list_versions", span.clone());

        let result: Result<Vec<SecretVersion>, BackendError> = async move {
            let authorization = self.authorization().await?;
            let path = format_versions_path(project, secret_name);
            let page_size = LIST_VERSIONS_PAGE_SIZE.to_string();

            let mut versions = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut request = self
                    .make_request(&path, &authorization)
                    .query(&[("pageSize", page_size.as_str())]);
                if let Some(token) = &page_token {
                    request = request.query(&[("pageToken", token.as_str())]);
                }

                let response = request
                    .send()
                    .await
                    .context("Failed to list secret versions")?;

                match response.status() {
                    status if status.is_success() => {
                        let page: ListSecretVersionsResponse = response
                            .json()
                            .await
                            .context("Failed to parse list secret versions response")?;
                        versions.extend(page.versions.into_iter().map(SecretVersion::from));

                        match page.next_page_token.filter(|token| !token.is_empty()) {
                            Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                                return Err(BackendError::Transport(anyhow::anyhow!(
                                    "Secret Manager repeated page token '{token}' while listing versions of {secret_name}"
                                )));
                            }
                            Some(token) => {
                                debug!("Fetching next page of versions for {}", secret_name);
                                page_token = Some(token);
                            }
                            None => break,
                        }
                    }
                    status if status == StatusCode::NOT_FOUND => {
                        return Err(BackendError::NotFound(path));
                    }
                    status => {
                        let error_text = response.text().await.unwrap_or_default();
                        return Err(BackendError::Transport(
                            self.handle_error_response(status, &error_text).context(format!(
                                "Failed to list versions of GCP secret: {secret_name}"
                            )),
                        ));
                    }
                }
            }

            Ok(versions)
        }
        .instrument(span)
        .await;

        tracker.record_outcome(&result);
        result
    }

    async fn access_version(&self, address: &str) -> Result<Vec<u8>, BackendError> {
        let span = tracing::debug_span!(
            "gcp.secret.access",
            secret.address = address,
            operation.success = field::Empty,
            operation.found = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new("access_version", span.clone());

        let result: Result<Vec<u8>, BackendError> = async move {
            let authorization = self.authorization().await?;
            let response = self
                .make_request(&format_access_path(address), &authorization)
                .send()
                .await
                .context("Failed to access secret version")?;

            match response.status() {
                status if status.is_success() => {
                    let access_response: AccessSecretVersionResponse = response
                        .json()
                        .await
                        .context("Failed to parse secret version response")?;

                    let decoded = general_purpose::STANDARD
                        .decode(access_response.payload.data.as_bytes())
                        .context("Failed to decode base64 secret data")?;
                    Ok(decoded)
                }
                status if status == StatusCode::NOT_FOUND => {
                    Err(BackendError::NotFound(address.to_string()))
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    Err(BackendError::Transport(
                        self.handle_error_response(status, &error_text)
                            .context(format!("Failed to access GCP secret version: {address}")),
                    ))
                }
            }
        }
        .instrument(span)
        .await;

        tracker.record_outcome(&result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::BACKEND_OPERATION_ERRORS_TOTAL;

    // Nothing listens on the discard port
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn errors_total(operation: &str) -> u64 {
        BACKEND_OPERATION_ERRORS_TOTAL
            .with_label_values(&[operation])
            .get()
    }

    #[tokio::test]
    async fn test_connection_failure_counts_as_list_error() {
        let client = SecretManagerRest::with_access_token(Some(UNREACHABLE), "t").unwrap();
        let before = errors_total("list_versions");

        let err = client.list_versions("p", "s").await.unwrap_err();

        assert!(matches!(err, BackendError::Transport(_)));
        assert!(errors_total("list_versions") > before);
    }

    #[tokio::test]
    async fn test_connection_failure_counts_as_access_error() {
        let client = SecretManagerRest::with_access_token(Some(UNREACHABLE), "t").unwrap();
        let before = errors_total("access_version");

        let err = client
            .access_version("projects/p/secrets/s/versions/1")
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Transport(_)));
        assert!(errors_total("access_version") > before);
    }
}
