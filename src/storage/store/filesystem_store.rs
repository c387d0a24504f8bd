//! A filesystem store.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use walkdir::WalkDir;

use crate::byte_range::ByteRange;
use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeyError, StoreKeys, StorePrefix, WritableStorageTraits,
};

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A synchronous filesystem store.
///
/// Each key maps to a file under a base directory. `set` writes a sibling
/// temporary file and renames it over the destination, so a concurrent
/// reader observes either the old value or the new value, never a torn one.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    readonly: bool,
}

/// A [`FilesystemStore`] creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The base path is not valid.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
}

impl FilesystemStore {
    /// Create a new filesystem store at `base_path`.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path` is not valid
    /// or points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }

        let readonly = if base_path.exists() {
            if !base_path.is_dir() {
                return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
            }
            std::fs::metadata(&base_path)?.permissions().readonly()
        } else {
            std::fs::create_dir_all(&base_path)?;
            false
        };

        Ok(Self {
            base_path,
            readonly,
        })
    }

    /// Map a [`StoreKey`] to a filesystem path.
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StoreKeyError> {
        let relative = pathdiff::diff_paths(path, &self.base_path)
            .ok_or_else(|| StoreKeyError::from(path.to_string_lossy().into_owned()))?;
        let mut key = relative.to_string_lossy().into_owned();
        if std::path::MAIN_SEPARATOR != '/' {
            key = key.replace(std::path::MAIN_SEPARATOR, "/");
        }
        StoreKey::new(key)
    }

    fn prefix_to_fspath(&self, prefix: &StorePrefix) -> PathBuf {
        self.base_path.join(prefix.as_str())
    }

    // In-flight temporary files are siblings of their destination with a
    // reserved ".<name>.<pid>.<seq>.tmp" shape; listing hides them.
    fn is_temp_file_name(name: &str) -> bool {
        name.starts_with('.') && name.ends_with(".tmp")
    }

    fn list_dir(&self, dir: &Path) -> Result<StoreKeys, StorageError> {
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if Self::is_temp_file_name(&entry.file_name().to_string_lossy()) {
                continue;
            }
            keys.push(self.fspath_to_key(entry.path())?);
        }
        keys.sort();
        Ok(keys)
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        match std::fs::read(self.key_to_fspath(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn get_range(
        &self,
        key: &StoreKey,
        byte_range: &ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        let mut file = match File::open(self.key_to_fspath(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let size = file.metadata()?.len();
        if !byte_range.fits(size) {
            return Err(crate::byte_range::InvalidByteRangeError::new(*byte_range, size).into());
        }
        file.seek(SeekFrom::Start(byte_range.start(size)))?;
        let length = usize::try_from(byte_range.length(size)).unwrap();
        let mut buffer = vec![0; length];
        file.read_exact(&mut buffer)?;
        Ok(Some(buffer))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match std::fs::metadata(self.key_to_fspath(key)) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let key_path = self.key_to_fspath(key);
        let parent = key_path
            .parent()
            .ok_or_else(|| StorageError::from(format!("store key {key} has no parent path")))?;
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }

        let file_name = key_path
            .file_name()
            .ok_or_else(|| StorageError::from(format!("store key {key} has no file name")))?
            .to_string_lossy()
            .into_owned();
        let temp_path = parent.join(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));

        std::fs::write(&temp_path, value)?;
        if let Err(err) = std::fs::rename(&temp_path, &key_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        match std::fs::remove_file(self.key_to_fspath(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        match std::fs::remove_dir_all(self.prefix_to_fspath(prefix)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.list_dir(&self.base_path)
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        self.list_dir(&self.prefix_to_fspath(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_store_get_set() {
        let path = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(path.path()).unwrap();
        let key = StoreKey::new("a/b").unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        store.set(&key, &[0, 1, 2]).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(vec![0, 1, 2]));
        assert_eq!(store.size_key(&key).unwrap(), Some(3));
        assert_eq!(
            store
                .get_range(&key, &ByteRange::FromEnd(0, Some(2)))
                .unwrap(),
            Some(vec![1, 2])
        );

        store.set(&key, &[]).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(vec![]));
    }

    #[test]
    fn filesystem_store_erase() {
        let path = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(path.path()).unwrap();
        let key = StoreKey::new("a/b").unwrap();
        store.erase(&key).unwrap();
        store.set(&key, &[0]).unwrap();
        store.erase(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn filesystem_store_list() {
        let path = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(path.path()).unwrap();
        store.set(&StoreKey::new("a/b").unwrap(), &[]).unwrap();
        store.set(&StoreKey::new("a/c").unwrap(), &[]).unwrap();
        store.set(&StoreKey::new("d").unwrap(), &[]).unwrap();
        assert_eq!(store.list().unwrap().len(), 3);
        assert_eq!(
            store.list_prefix(&StorePrefix::new("a/").unwrap()).unwrap(),
            vec![StoreKey::new("a/b").unwrap(), StoreKey::new("a/c").unwrap()]
        );
        store
            .erase_prefix(&StorePrefix::new("a/").unwrap())
            .unwrap();
        assert_eq!(store.list().unwrap(), vec![StoreKey::new("d").unwrap()]);
    }

    #[test]
    fn filesystem_store_invalid_base() {
        let path = tempfile::NamedTempFile::new().unwrap();
        assert!(FilesystemStore::new(path.path()).is_err());
    }
}
