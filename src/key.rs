//! # Secret Keys
//!
//! A lookup key is either a bare secret name or a `(name, version)` pair.
//!
//! A bare name always means the same thing as `(name, "latest")`, so the store
//! caches values under both shapes. Validation happens when a key is built
//! through [`SecretKey::new`], [`SecretKey::versioned`] or one of the `TryFrom`
//! conversions, and again in the resolver for keys built from the variants.

use crate::constants::{LATEST_VERSION, MAX_SECRET_NAME_LEN};
use crate::error::{Result, SecretStoreError};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

const KEY_ERROR: &str = "Key can be either string or tuple with 2 strings";

static SECRET_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("secret name pattern is a valid regex")
});

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("version pattern is a valid regex"));

/// Key used to look up a secret
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretKey {
    /// Bare secret name, resolved to the latest active version
    Name(String),
    /// Secret name with an explicit version (`"latest"` or decimal digits)
    NameVersion(String, String),
}

impl SecretKey {
    /// Build a bare-name key
    ///
    /// # Errors
    /// Returns [`SecretStoreError::InvalidArgument`] if the name is malformed
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self::Name(name))
    }

    /// Build a `(name, version)` key
    ///
    /// # Errors
    /// Returns [`SecretStoreError::InvalidArgument`] if the name or version is malformed
    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version = version.into();
        validate_name(&name)?;
        validate_version(&version)?;
        Ok(Self::NameVersion(name, version))
    }

    /// Build a key from a dynamically shaped value.
    ///
    /// A JSON string is a bare name and a two-element array of strings is a
    /// `(name, version)` pair. Anything else is rejected with the received
    /// type and value in the message.
    ///
    /// # Errors
    /// Returns [`SecretStoreError::InvalidArgument`] for any other shape or for
    /// a malformed name or version
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Self::new(name.as_str()),
            Value::Array(items) => match items.as_slice() {
                [Value::String(name), Value::String(version)] => {
                    Self::versioned(name.as_str(), version.as_str())
                }
                _ => Err(shape_error(value)),
            },
            _ => Err(shape_error(value)),
        }
    }

    /// Secret name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::NameVersion(name, _) => name,
        }
    }

    /// Requested version, `"latest"` for a bare name
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Name(_) => LATEST_VERSION,
            Self::NameVersion(_, version) => version,
        }
    }

    /// True if this is a bare name
    #[must_use]
    pub fn is_bare(&self) -> bool {
        matches!(self, Self::Name(_))
    }

    /// The explicit `(name, "latest")` form of a bare name
    #[must_use]
    pub fn latest_alias(&self) -> Option<Self> {
        match self {
            Self::Name(name) => Some(Self::NameVersion(
                name.clone(),
                LATEST_VERSION.to_string(),
            )),
            Self::NameVersion(..) => None,
        }
    }

    /// Re-check a key that may have been built directly from the variants
    pub(crate) fn validate(&self) -> Result<()> {
        validate_name(self.name())?;
        validate_version(self.version())
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::NameVersion(name, version) => write!(f, "{name}@{version}"),
        }
    }
}

impl TryFrom<&str> for SecretKey {
    type Error = SecretStoreError;

    fn try_from(name: &str) -> Result<Self> {
        Self::new(name)
    }
}

impl TryFrom<String> for SecretKey {
    type Error = SecretStoreError;

    fn try_from(name: String) -> Result<Self> {
        Self::new(name)
    }
}

impl TryFrom<(&str, &str)> for SecretKey {
    type Error = SecretStoreError;

    fn try_from((name, version): (&str, &str)) -> Result<Self> {
        Self::versioned(name, version)
    }
}

/// Validate a secret name: non-empty, at most 255 of `[A-Za-z0-9_-]`
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SecretStoreError::InvalidArgument(
            "Secret name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_SECRET_NAME_LEN {
        return Err(SecretStoreError::InvalidArgument(format!(
            "Secret name is {} characters long, maximum is {MAX_SECRET_NAME_LEN}",
            name.len()
        )));
    }
    if !SECRET_NAME_RE.is_match(name) {
        return Err(SecretStoreError::InvalidArgument(format!(
            "Secret name '{name}' may only contain letters, digits, hyphens and underscores"
        )));
    }
    Ok(())
}

/// Validate a version: `"latest"` or decimal digits
pub(crate) fn validate_version(version: &str) -> Result<()> {
    if version == LATEST_VERSION || VERSION_RE.is_match(version) {
        Ok(())
    } else {
        Err(SecretStoreError::InvalidArgument(format!(
            "Version '{version}' must be '{LATEST_VERSION}' or a decimal number"
        )))
    }
}

fn shape_error(value: &Value) -> SecretStoreError {
    let type_name = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "tuple",
        Value::Object(_) => "dict",
    };
    SecretStoreError::InvalidArgument(format!("{KEY_ERROR}. Got {type_name} with value {value}"))
}
