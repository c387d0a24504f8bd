//! Store keys.

use derive_more::Display;
use thiserror::Error;

use super::store_prefix::StorePrefix;

/// A validated store key: non-empty `/`-separated segments with no leading or
/// trailing separator.
#[derive(Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StoreKey(String);

/// A sequence of store keys.
pub type StoreKeys = Vec<StoreKey>;

/// An invalid store key.
#[derive(Clone, Debug, Error)]
#[error("invalid store key {0}")]
pub struct StoreKeyError(String);

impl From<String> for StoreKeyError {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl StoreKey {
    /// Create a new store key from `key`.
    ///
    /// # Errors
    /// Returns [`StoreKeyError`] if `key` is not valid.
    pub fn new(key: impl Into<String>) -> Result<Self, StoreKeyError> {
        let key = key.into();
        if Self::validate(&key) {
            Ok(Self(key))
        } else {
            Err(StoreKeyError(key))
        }
    }

    /// Create a new store key from `key` without validation.
    ///
    /// # Safety
    /// `key` must be a valid store key.
    #[must_use]
    pub unsafe fn new_unchecked(key: String) -> Self {
        debug_assert!(Self::validate(&key));
        Self(key)
    }

    /// Validate a store key.
    #[must_use]
    pub fn validate(key: &str) -> bool {
        !key.is_empty()
            && !key.starts_with('/')
            && !key.ends_with('/')
            && !key.contains("//")
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is under `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &StorePrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StoreKeyError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_key_valid() {
        assert!(StoreKey::new("a").is_ok());
        assert!(StoreKey::new("a/b/c.json").is_ok());
    }

    #[test]
    fn store_key_invalid() {
        assert!(StoreKey::new("").is_err());
        assert!(StoreKey::new("/a").is_err());
        assert!(StoreKey::new("a/").is_err());
        assert!(StoreKey::new("a//b").is_err());
    }

    #[test]
    fn store_key_prefix() {
        let key = StoreKey::new("a/b/c").unwrap();
        assert!(key.has_prefix(&StorePrefix::new("a/b/").unwrap()));
        assert!(!key.has_prefix(&StorePrefix::new("b/").unwrap()));
    }
}
