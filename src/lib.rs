//! GCP Secrets Library
//!
//! Read-only, dictionary-style access to Google Cloud Secret Manager.
//! A key is a bare secret name (latest enabled version) or a
//! `(name, version)` pair. Resolved addresses and decoded values are cached
//! with a time-to-live.
//!
//! ## Quick Start
//!
//! ```rust
//! use gcp_secrets::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod key;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod resolver;
pub mod store;

pub use config::SecretStoreConfig;
pub use error::{BackendError, Result, SecretStoreError};
pub use key::SecretKey;
pub use resolver::{AddressResolver, VersionRecord};
pub use store::{SecretStore, SecretStoreBuilder};
