use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::array_subset::ArraySubset;
use crate::storage::ReadableWritableStorageTraits;

use super::array_bytes::update_array_bytes;
use super::array_sync_readable::chunk_indices_from_linear;
use super::codec::CodecOptions;
use super::{transmute_to_bytes_vec, Array, ArrayBytes, ArrayError};

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Write `chunk_subset_bytes` to the `chunk_subset` of the chunk at
    /// `chunk_indices`.
    ///
    /// `chunk_subset` is in chunk coordinates. A partial chunk write reads
    /// the chunk, overlays the subset, and writes the chunk back; concurrent
    /// writers of the same chunk race at chunk granularity.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the chunk subset is outside the chunk,
    /// the input does not match the subset shape and data type, or retrieval,
    /// encoding, or storage fails.
    pub fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: ArrayBytes,
    ) -> Result<(), ArrayError> {
        self.store_chunk_subset_opt(
            chunk_indices,
            chunk_subset,
            chunk_subset_bytes,
            &CodecOptions::default(),
        )
    }

    /// Explicit options version of
    /// [`store_chunk_subset`](Array::store_chunk_subset).
    ///
    /// # Errors
    /// See [`store_chunk_subset`](Array::store_chunk_subset).
    pub fn store_chunk_subset_opt(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: ArrayBytes,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        let representation = self.chunk_representation(chunk_indices)?;
        let chunk_shape = representation.shape_u64();
        if chunk_subset.dimensionality() != chunk_shape.len()
            || !chunk_subset.inbounds(&chunk_shape)
        {
            return Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_shape,
            ));
        }
        chunk_subset_bytes.validate(
            chunk_subset.num_elements(),
            representation.data_type_size(),
        )?;

        if chunk_subset.start().iter().all(|&start| start == 0)
            && chunk_subset.shape() == chunk_shape
        {
            self.store_chunk_opt(chunk_indices, chunk_subset_bytes, options)
        } else {
            // read-modify-write at chunk granularity
            let chunk_bytes = self.retrieve_chunk_opt(chunk_indices, options)?;
            let chunk_bytes = update_array_bytes(
                chunk_bytes,
                &chunk_shape,
                &chunk_subset_bytes,
                chunk_subset,
                representation.data_type_size(),
            )?;
            self.store_chunk_opt(chunk_indices, chunk_bytes, options)
        }
    }

    /// Write `subset_elements` to the `chunk_subset` of the chunk at
    /// `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or see [`store_chunk_subset`](Array::store_chunk_subset).
    pub fn store_chunk_subset_elements<T: bytemuck::NoUninit>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        subset_elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_chunk_subset(
            chunk_indices,
            chunk_subset,
            ArrayBytes::new_flen(transmute_to_bytes_vec(subset_elements)),
        )
    }

    /// Write `subset_bytes` to the elements of `array_subset`.
    ///
    /// Chunks fully covered by the subset are written directly; partially
    /// covered chunks are read-modify-written. Chunks are processed in
    /// parallel; any chunk failure fails the whole write, and chunks already
    /// written are not rolled back.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `array_subset` is outside the array
    /// bounds, the input does not match the subset shape and data type, or
    /// any chunk write fails.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: ArrayBytes,
    ) -> Result<(), ArrayError> {
        self.store_array_subset_opt(array_subset, subset_bytes, &CodecOptions::default())
    }

    /// Explicit options version of
    /// [`store_array_subset`](Array::store_array_subset).
    ///
    /// # Errors
    /// See [`store_array_subset`](Array::store_array_subset).
    pub fn store_array_subset_opt(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: ArrayBytes,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        self.validate_array_subset(array_subset)?;
        if let Err(err) =
            subset_bytes.validate(array_subset.num_elements(), self.data_type().size())
        {
            return Err(match err {
                super::codec::CodecError::UnexpectedChunkDecodedSize(got, expected) => {
                    ArrayError::InvalidBytesInputSize(got, expected)
                }
                err => err.into(),
            });
        }

        let chunks = self.chunk_grid().chunks_in_array_subset(array_subset)?;
        match chunks.num_elements() {
            0 => Ok(()),
            1 => {
                let chunk_indices = chunks.start();
                self.store_array_subset_in_chunk(
                    chunk_indices,
                    array_subset,
                    &subset_bytes,
                    options,
                )
            }
            _ => {
                let store_chunk = |chunk_indices: Vec<u64>| -> Result<(), ArrayError> {
                    self.store_array_subset_in_chunk(
                        &chunk_indices,
                        array_subset,
                        &subset_bytes,
                        options,
                    )
                };
                if options.concurrent_target() > 1 {
                    (0..chunks.num_elements())
                        .into_par_iter()
                        .try_for_each(|chunk_index| {
                            store_chunk(chunk_indices_from_linear(&chunks, chunk_index))
                        })
                } else {
                    for chunk_indices in &chunks.indices() {
                        store_chunk(chunk_indices)?;
                    }
                    Ok(())
                }
            }
        }
    }

    /// Write `subset_elements` to the elements of `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or see [`store_array_subset`](Array::store_array_subset).
    pub fn store_array_subset_elements<T: bytemuck::NoUninit>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_array_subset(
            array_subset,
            ArrayBytes::new_flen(transmute_to_bytes_vec(subset_elements)),
        )
    }

    // Write the part of `subset_bytes` overlapping one chunk.
    fn store_array_subset_in_chunk(
        &self,
        chunk_indices: &[u64],
        array_subset: &ArraySubset,
        subset_bytes: &ArrayBytes,
        options: &CodecOptions,
    ) -> Result<(), ArrayError> {
        let chunk_subset = self.chunk_grid().chunk_subset(chunk_indices)?;
        let overlap = array_subset.overlap(&chunk_subset)?;
        let chunk_subset_bytes = subset_bytes.extract_array_subset(
            &overlap.relative_to(array_subset.start())?,
            array_subset.shape(),
            self.data_type(),
        )?;
        if overlap == chunk_subset {
            // the subset covers this chunk entirely, no read back needed
            self.store_chunk_opt(chunk_indices, chunk_subset_bytes, options)
        } else {
            self.store_chunk_subset_opt(
                chunk_indices,
                &overlap.relative_to(chunk_subset.start())?,
                chunk_subset_bytes,
                options,
            )
        }
    }
}
