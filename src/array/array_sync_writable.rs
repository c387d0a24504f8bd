use crate::array_subset::ArraySubset;
use crate::storage::{array_prefix, WritableStorageTraits};

use super::codec::CodecOptions;
use super::{transmute_to_bytes_vec, Array, ArrayBytes, ArrayError};

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Write the metadata document of the array to the store.
    ///
    /// The document is replaced atomically; a concurrent reader observes
    /// either the old document or the new one.
    ///
    /// # Errors
    /// Returns a [`StorageError`](crate::storage::StorageError) on a store failure.
    pub fn store_metadata(&self) -> Result<(), ArrayError> {
        let bytes = self.metadata().to_vec();
        Ok(self.storage.set(&self.meta_key(), &bytes)?)
    }

    /// Encode `chunk_bytes` and store the chunk at `chunk_indices`.
    ///
    /// A chunk composed entirely of the fill value is erased instead of
    /// stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are outside the chunk
    /// grid, `chunk_bytes` does not match the chunk shape and data type, or
    /// encoding or storage fails.
    pub fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: ArrayBytes,
    ) -> Result<(), ArrayError> {
        self.store_chunk_opt(chunk_indices, chunk_bytes, &CodecOptions::default())
    }

    /// Explicit options version of [`store_chunk`](Array::store_chunk).
    ///
    /// # Errors
    /// See [`store_chunk`](Array::store_chunk).
    pub fn store_chunk_opt(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: ArrayBytes,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        let representation = self.chunk_representation(chunk_indices)?;
        if let Err(err) = chunk_bytes.validate(
            representation.num_elements(),
            representation.data_type_size(),
        ) {
            return Err(match err {
                super::codec::CodecError::UnexpectedChunkDecodedSize(got, expected) => {
                    ArrayError::InvalidBytesInputSize(got, expected)
                }
                err => err.into(),
            });
        }

        if chunk_bytes.is_fill_value(self.fill_value()) {
            self.erase_chunk(chunk_indices)
        } else {
            let encoded = self
                .codecs()
                .encode(chunk_bytes, &representation, options)?;
            Ok(self.storage.set(&self.chunk_key(chunk_indices), &encoded)?)
        }
    }

    /// Encode `chunk_elements` and store the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or see [`store_chunk`](Array::store_chunk).
    pub fn store_chunk_elements<T: bytemuck::NoUninit>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_chunk(
            chunk_indices,
            ArrayBytes::new_flen(transmute_to_bytes_vec(chunk_elements)),
        )
    }

    /// Erase the chunk at `chunk_indices`. Succeeds if the chunk is absent.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are outside the chunk
    /// grid or the store fails.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        if self.chunk_indices_inbounds(chunk_indices) {
            Ok(self.storage.erase(&self.chunk_key(chunk_indices))?)
        } else {
            Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
        }
    }

    /// Erase every chunk whose grid coordinates are in `chunks`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if any chunk in `chunks` is outside the
    /// chunk grid or the store fails.
    pub fn erase_chunks(&self, chunks: &ArraySubset) -> Result<(), ArrayError> {
        for chunk_indices in &chunks.indices() {
            self.erase_chunk(&chunk_indices)?;
        }
        Ok(())
    }

    /// Erase all chunks and the metadata document of the array.
    ///
    /// # Errors
    /// Returns a [`StorageError`](crate::storage::StorageError) on a store failure.
    pub fn erase(&self) -> Result<(), ArrayError> {
        Ok(self.storage.erase_prefix(&array_prefix(self.path()))?)
    }
}
