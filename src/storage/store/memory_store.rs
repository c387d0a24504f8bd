//! An in-memory store.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::byte_range::{extract_byte_ranges, ByteRange};
use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, StoreKeys,
    StorePrefix, WritableStorageTraits,
};

/// A synchronous in-memory store.
///
/// Values are replaced wholesale under the write lock, so every key
/// operation is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    fn get_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        let data = self.data.read();
        let Some(value) = data.get(key) else {
            return Ok(None);
        };
        let mut extracted = extract_byte_ranges(value, &[*byte_range])?;
        Ok(Some(extracted.remove(0)))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let data = self.data.read();
        Ok(data.get(key).map(|value| value.len() as u64))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write();
        data.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let mut data = self.data.write();
        data.remove(key);
        Ok(())
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        let mut data = self.data.write();
        data.retain(|key, _| !key.has_prefix(prefix));
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        let data = self.data.read();
        Ok(data.keys().cloned().collect())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let data = self.data.read();
        Ok(data
            .keys()
            .filter(|key| key.has_prefix(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a/b").unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        store.set(&key, &[0, 1, 2]).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(vec![0, 1, 2]));
        assert_eq!(store.size_key(&key).unwrap(), Some(3));

        // absent is distinct from empty
        store.set(&key, &[]).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(vec![]));
    }

    #[test]
    fn memory_store_get_range() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a").unwrap();
        store.set(&key, &[0, 1, 2, 3]).unwrap();
        assert_eq!(
            store
                .get_range(&key, &ByteRange::FromStart(1, Some(2)))
                .unwrap(),
            Some(vec![1, 2])
        );
        assert!(store
            .get_range(&key, &ByteRange::FromStart(3, Some(2)))
            .is_err());
        assert_eq!(
            store
                .get_range(&StoreKey::new("missing").unwrap(), &ByteRange::FromStart(0, None))
                .unwrap(),
            None
        );
    }

    #[test]
    fn memory_store_erase() {
        let store = MemoryStore::new();
        let key = StoreKey::new("a").unwrap();
        store.erase(&key).unwrap();
        store.set(&key, &[0]).unwrap();
        store.erase(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn memory_store_list() {
        let store = MemoryStore::new();
        store.set(&StoreKey::new("a/b").unwrap(), &[]).unwrap();
        store.set(&StoreKey::new("a/c").unwrap(), &[]).unwrap();
        store.set(&StoreKey::new("b").unwrap(), &[]).unwrap();
        assert_eq!(store.list().unwrap().len(), 3);
        let under_a = store
            .list_prefix(&StorePrefix::new("a/").unwrap())
            .unwrap();
        assert_eq!(
            under_a,
            vec![
                StoreKey::new("a/b").unwrap(),
                StoreKey::new("a/c").unwrap()
            ]
        );
        store
            .erase_prefix(&StorePrefix::new("a/").unwrap())
            .unwrap();
        assert_eq!(store.list().unwrap(), vec![StoreKey::new("b").unwrap()]);
    }
}
