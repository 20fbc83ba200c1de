//! # Observability
//!
//! - `metrics`: Prometheus metrics collection
//! - `init_tracing`: tracing-subscriber setup for binaries and tests

pub mod metrics;

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive` (e.g. `"gcp_secrets=info"`).
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()),
        )
        .try_init()
        .is_ok()
}
