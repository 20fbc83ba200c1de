//! Common utilities and helpers for the GCP Secret Manager client
//!
//! Resource path formatting and per-operation span/metric bookkeeping.

use crate::error::BackendError;
use crate::observability::metrics;
use std::time::{Duration, Instant};
use tracing::Span;

/// Formats a GCP secret resource path
pub fn format_secret_path(project_id: &str, secret_name: &str) -> String {
    format!("projects/{project_id}/secrets/{secret_name}")
}

/// Formats the collection path used to list a secret's versions
pub fn format_versions_path(project_id: &str, secret_name: &str) -> String {
    format!("{}/versions", format_secret_path(project_id, secret_name))
}

/// Formats the access path for a version address
/// (`projects/*/secrets/*/versions/*`)
pub fn format_access_path(address: &str) -> String {
    format!("{address}:access")
}

/// Extracts the version id (last path segment) from a version address
pub fn version_id_from_address(address: &str) -> &str {
    address.rsplit('/').next().unwrap_or(address)
}

/// Records operation metrics and span attributes for a successful operation
pub fn record_success_metrics(span: &Span, operation: &str, duration: Duration) {
    span.record("operation.success", true);
    span.record("operation.duration_ms", duration_ms(duration));
    metrics::record_backend_operation(operation, duration.as_secs_f64());
}

/// Records a 404 from the API. The call itself succeeded.
pub fn record_not_found_metrics(span: &Span, operation: &str, duration: Duration) {
    span.record("operation.success", true);
    span.record("operation.found", false);
    span.record("operation.duration_ms", duration_ms(duration));
    metrics::record_backend_operation(operation, duration.as_secs_f64());
}

/// Records operation metrics and span attributes for a failed operation
pub fn record_error_metrics(span: &Span, operation: &str, error_message: &str, duration: Duration) {
    span.record("operation.success", false);
    span.record("error.message", error_message);
    span.record("operation.duration_ms", duration_ms(duration));
    metrics::increment_backend_operation_errors(operation);
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Helper struct for tracking operation state
#[derive(Debug)]
pub struct OperationTracker {
    operation: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTracker {
    /// Create a new operation tracker
    pub fn new(operation: &'static str, span: Span) -> Self {
        Self {
            operation,
            start: Instant::now(),
            span,
        }
    }

    pub fn record_success(&self) {
        record_success_metrics(&self.span, self.operation, self.start.elapsed());
    }

    pub fn record_not_found(&self) {
        record_not_found_metrics(&self.span, self.operation, self.start.elapsed());
    }

    pub fn record_error(&self, error_message: &str) {
        record_error_metrics(
            &self.span,
            self.operation,
            error_message,
            self.start.elapsed(),
        );
    }

    /// Record whichever of success, not-found or error `result` represents
    pub fn record_outcome<T>(&self, result: &Result<T, BackendError>) {
        match result {
            Ok(_) => self.record_success(),
            Err(BackendError::NotFound(_)) => self.record_not_found(),
            Err(BackendError::Transport(err)) => self.record_error(&format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            format_secret_path("test-project", "api-key"),
            "projects/test-project/secrets/api-key"
        );
        assert_eq!(
            format_versions_path("test-project", "api-key"),
            "projects/test-project/secrets/api-key/versions"
        );
        assert_eq!(
            format_access_path("projects/test-project/secrets/api-key/versions/2"),
            "projects/test-project/secrets/api-key/versions/2:access"
        );
    }

    #[test]
    fn test_version_id_from_address() {
        assert_eq!(
            version_id_from_address("projects/p/secrets/s/versions/12"),
            "12"
        );
        assert_eq!(version_id_from_address("7"), "7");
    }
}
