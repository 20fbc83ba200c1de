//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use gcp_secrets::prelude::*;
//! ```
//!
//! This brings into scope:
//! - The store and its builder and configuration
//! - Key and error types
//! - Backend capability traits, for plugging in other backends

pub use crate::config::SecretStoreConfig;
pub use crate::error::{BackendError, SecretStoreError};
pub use crate::key::SecretKey;
pub use crate::provider::gcp::{DefaultIdentity, SecretManagerRest};
pub use crate::provider::{AmbientIdentity, SecretBackend, SecretVersion, VersionState};
pub use crate::store::{SecretStore, SecretStoreBuilder};
