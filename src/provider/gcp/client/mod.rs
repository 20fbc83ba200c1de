//! GCP Secret Manager Client
//!
//! Native REST implementation using reqwest. Shared path and tracking helpers
//! live in [`common`].

pub mod common;
pub mod rest;

pub use rest::SecretManagerRest;
