//! A retrying storage adapter.
//!
//! [`RetryStore`] wraps any store and retries operations that fail with a
//! transient [`StorageError`] ([`StorageError::is_transient`]), sleeping with
//! exponential backoff between attempts. Permanent errors propagate
//! immediately.

use std::sync::Arc;
use std::time::Duration;

use crate::byte_range::ByteRange;

use super::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, StoreKeys,
    StorePrefix, WritableStorageTraits,
};

/// Retry behaviour for a [`RetryStore`].
#[derive(Copy, Clone, Debug)]
pub struct RetryOptions {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryOptions {
    /// Set the maximum number of retries after the initial attempt.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry. The delay doubles per retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set the upper bound on the delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

/// A store wrapper that retries transient failures with exponential backoff.
#[derive(Debug)]
pub struct RetryStore<TStorage: ?Sized> {
    options: RetryOptions,
    storage: Arc<TStorage>,
}

impl<TStorage: ?Sized> RetryStore<TStorage> {
    /// Create a new retry adapter over `storage` with `options`.
    #[must_use]
    pub fn new(storage: Arc<TStorage>, options: RetryOptions) -> Self {
        Self { options, storage }
    }

    fn retry<T>(
        &self,
        mut op: impl FnMut() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut delay = self.options.initial_delay;
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.options.max_retries => {
                    std::thread::sleep(delay);
                    delay = std::cmp::min(delay * 2, self.options.max_delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<TStorage: ReadableStorageTraits + ?Sized> ReadableStorageTraits for RetryStore<TStorage> {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.retry(|| self.storage.get(key))
    }

    fn get_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        self.retry(|| self.storage.get_range(key, byte_range))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.retry(|| self.storage.size_key(key))
    }
}

impl<TStorage: WritableStorageTraits + ?Sized> WritableStorageTraits for RetryStore<TStorage> {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        self.retry(|| self.storage.set(key, value))
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.retry(|| self.storage.erase(key))
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.retry(|| self.storage.erase_prefix(prefix))
    }
}

impl<TStorage: ListableStorageTraits + ?Sized> ListableStorageTraits for RetryStore<TStorage> {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.retry(|| self.storage.list())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        self.retry(|| self.storage.list_prefix(prefix))
    }
}
