//! The store abstraction.
//!
//! A store is key → bytes persistence addressed by hierarchical string keys.
//! The traits split the surface by capability: [`ReadableStorageTraits`],
//! [`WritableStorageTraits`], and [`ListableStorageTraits`], with
//! [`ReadableWritableStorageTraits`] as a blanket combination.
//!
//! Store guarantees:
//! - every operation is atomic at single-key granularity; a concurrent
//!   reader never observes a partially written value for one key,
//! - there is no cross-key transactionality; multi-chunk writes are not
//!   atomic as a whole,
//! - a missing key is an explicit absent signal ([`None`]), distinct from an
//!   empty value.
//!
//! [`StorageError`] classifies backend failures as transient or permanent
//! ([`StorageError::is_transient`]); the [`RetryStore`](retry::RetryStore)
//! adapter retries transient failures with backoff.

pub mod retry;
pub mod store;
mod store_key;
mod store_prefix;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError};

use thiserror::Error;

use crate::byte_range::{ByteRange, InvalidByteRangeError};
use crate::node_path::NodePath;

/// The bytes of a store value, or [`None`] if the key is absent.
pub type MaybeBytes = Option<Vec<u8>>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error from the backend.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid store prefix.
    #[error(transparent)]
    InvalidStorePrefix(#[from] StorePrefixError),
    /// A byte range outside the bounds of a value.
    #[error(transparent)]
    InvalidByteRange(#[from] InvalidByteRangeError),
    /// The store is read-only.
    #[error("the store is read-only")]
    ReadOnly,
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// Returns true if the error is transient and the operation is worth retrying.
    ///
    /// Transience is inferred from the [`std::io::ErrorKind`] where the
    /// backend surfaces one; all other errors are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::IOError(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

impl From<String> for StorageError {
    fn from(error_str: String) -> Self {
        Self::Other(error_str)
    }
}

impl From<&str> for StorageError {
    fn from(error_str: &str) -> Self {
        Self::Other(error_str.to_string())
    }
}

/// Readable storage.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value at `key`, or [`None`] if the key is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Retrieve `byte_range` of the value at `key`, or [`None`] if the key is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure or if the byte range
    /// does not fit within the value.
    fn get_range(&self, key: &StoreKey, byte_range: &ByteRange)
        -> Result<MaybeBytes, StorageError>;

    /// Retrieve the size in bytes of the value at `key`, or [`None`] if the key is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;
}

/// Writable storage.
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`, replacing any existing value atomically.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError>;

    /// Erase the value at `key`. Succeeds if the key is already absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Erase all values under `prefix`. Succeeds if the prefix is empty.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;
}

/// Listable storage.
pub trait ListableStorageTraits: Send + Sync {
    /// List all keys in the store, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn list(&self) -> Result<StoreKeys, StorageError>;

    /// List all keys under `prefix`, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;
}

/// Readable and writable storage.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T: ReadableStorageTraits + WritableStorageTraits + ?Sized> ReadableWritableStorageTraits
    for T
{
}

/// Return the store prefix under which all keys of an array at `path` live.
#[must_use]
pub fn array_prefix(path: &NodePath) -> StorePrefix {
    if path.as_str() == "/" {
        StorePrefix::root()
    } else {
        // a valid non-root node path without its leading / is a valid prefix body
        StorePrefix::new(format!("{}/", &path.as_str()[1..])).expect("node path is validated")
    }
}

/// Return the store key of the metadata document of an array at `path`.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    StoreKey::new(format!("{}array.json", array_prefix(path).as_str()))
        .expect("node path is validated")
}

/// Return the store key of a chunk with encoded chunk identifier
/// `chunk_key` of an array at `path`.
#[must_use]
pub fn data_key(path: &NodePath, chunk_key: &str) -> StoreKey {
    StoreKey::new(format!("{}{chunk_key}", array_prefix(path).as_str()))
        .expect("node path and chunk key are validated")
}
