//! # GCP Secret Manager
//!
//! Google Cloud implementation of the backend capabilities:
//!
//! - [`SecretManagerRest`]: REST v1 client implementing [`crate::provider::SecretBackend`]
//! - [`identity`]: default-project discovery implementing [`crate::provider::AmbientIdentity`]

pub mod client;
pub mod identity;

pub use client::SecretManagerRest;
pub use identity::{DefaultIdentity, EnvironmentIdentity, MetadataServerIdentity};
