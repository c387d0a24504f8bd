use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::array_subset::ArraySubset;
use crate::node_path::NodePath;
use crate::storage::ReadableStorageTraits;

use super::array_bytes::{update_array_bytes, update_bytes_flen};
use super::codec::CodecOptions;
use super::{
    transmute_from_bytes_vec, unravel_index, Array, ArrayBytes, ArrayCreateError, ArrayError,
    ArrayMetadata, ArraySize, DataTypeSize, UnsafeCellSlice,
};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array at `path` in `storage` by reading its metadata
    /// document.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the metadata document is missing or
    /// invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::try_from(path)?;
        let bytes = storage
            .get(&crate::storage::meta_key(&node_path))?
            .ok_or_else(|| ArrayCreateError::MissingMetadata(path.to_string()))?;
        let metadata = ArrayMetadata::from_slice(&bytes)?;
        Self::new_with_metadata(storage, path, metadata)
    }

    /// Read and decode the chunk at `chunk_indices`.
    ///
    /// An absent chunk decodes to the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are outside the chunk
    /// grid, or the chunk cannot be retrieved or decoded.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<ArrayBytes, ArrayError> {
        self.retrieve_chunk_opt(chunk_indices, &CodecOptions::default())
    }

    /// Explicit options version of [`retrieve_chunk`](Array::retrieve_chunk).
    ///
    /// # Errors
    /// See [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_opt(
        &self,
        chunk_indices: &[u64],
        options: &CodecOptions,
    ) -> Result<ArrayBytes, ArrayError> {
        // bounds are validated before any store access
        let representation = self.chunk_representation(chunk_indices)?;
        match self.storage.get(&self.chunk_key(chunk_indices))? {
            Some(encoded) => {
                let decoded = self.codecs().decode(encoded, &representation, options)?;
                decoded.validate(
                    representation.num_elements(),
                    representation.data_type_size(),
                )?;
                Ok(decoded)
            }
            None => Ok(ArrayBytes::new_fill_value(
                ArraySize::new(
                    representation.data_type_size(),
                    representation.num_elements(),
                ),
                self.fill_value(),
            )),
        }
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its
    /// elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or see [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_chunk(chunk_indices)?;
        Ok(transmute_from_bytes_vec(bytes.into_fixed()?))
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// `chunk_subset` is in chunk coordinates.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the chunk subset is outside the chunk, or
    /// see [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<ArrayBytes, ArrayError> {
        self.retrieve_chunk_subset_opt(chunk_indices, chunk_subset, &CodecOptions::default())
    }

    /// Explicit options version of
    /// [`retrieve_chunk_subset`](Array::retrieve_chunk_subset).
    ///
    /// # Errors
    /// See [`retrieve_chunk_subset`](Array::retrieve_chunk_subset).
    pub fn retrieve_chunk_subset_opt(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, ArrayError> {
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

        let chunk_bytes = self.retrieve_chunk_opt(chunk_indices, options)?;
        if chunk_subset.start().iter().all(|&start| start == 0)
            && chunk_subset.shape() == chunk_shape
        {
            Ok(chunk_bytes)
        } else {
            Ok(chunk_bytes.extract_array_subset(chunk_subset, &chunk_shape, self.data_type())?)
        }
    }

    /// Read and decode the elements of `array_subset`.
    ///
    /// Regions not covered by any stored chunk are filled with the fill
    /// value. Chunks are processed in parallel; any chunk failure fails the
    /// whole read.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `array_subset` is outside the array
    /// bounds or any chunk cannot be retrieved or decoded.
    pub fn retrieve_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArrayBytes, ArrayError> {
        self.retrieve_array_subset_opt(array_subset, &CodecOptions::default())
    }

    /// Explicit options version of
    /// [`retrieve_array_subset`](Array::retrieve_array_subset).
    ///
    /// # Errors
    /// See [`retrieve_array_subset`](Array::retrieve_array_subset).
    pub fn retrieve_array_subset_opt(
        &self,
        array_subset: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, ArrayError> {
        self.validate_array_subset(array_subset)?;
        let chunks = self.chunk_grid().chunks_in_array_subset(array_subset)?;
        match chunks.num_elements() {
            0 => Ok(ArrayBytes::new_fill_value(
                ArraySize::new(self.data_type().size(), 0),
                self.fill_value(),
            )),
            1 => {
                let chunk_indices = chunks.start();
                let chunk_subset = self.chunk_grid().chunk_subset(chunk_indices)?;
                if &chunk_subset == array_subset {
                    self.retrieve_chunk_opt(chunk_indices, options)
                } else {
                    let overlap = array_subset.overlap(&chunk_subset)?;
                    self.retrieve_chunk_subset_opt(
                        chunk_indices,
                        &overlap.relative_to(chunk_subset.start())?,
                        options,
                    )
                }
            }
            _ => match self.data_type().size() {
                DataTypeSize::Fixed(data_type_size) => {
                    self.retrieve_array_subset_flen(array_subset, &chunks, data_type_size, options)
                }
                DataTypeSize::Variable => {
                    self.retrieve_array_subset_vlen(array_subset, &chunks, options)
                }
            },
        }
    }

    /// Read and decode the elements of `array_subset` into a vector.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or see [`retrieve_array_subset`](Array::retrieve_array_subset).
    pub fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_array_subset(array_subset)?;
        Ok(transmute_from_bytes_vec(bytes.into_fixed()?))
    }

    fn retrieve_array_subset_flen(
        &self,
        array_subset: &ArraySubset,
        chunks: &ArraySubset,
        data_type_size: usize,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, ArrayError> {
        let size_output = array_subset.num_elements_usize() * data_type_size;
        if size_output == 0 {
            return Ok(ArrayBytes::new_flen(vec![]));
        }

        let mut output = Vec::with_capacity(size_output);
        {
            let output_slice = UnsafeCellSlice::new_from_vec_with_spare_capacity(&mut output);
            let retrieve_chunk_into_output = |chunk_indices: Vec<u64>| -> Result<(), ArrayError> {
                let chunk_subset = self.chunk_grid().chunk_subset(&chunk_indices)?;
                let overlap = array_subset.overlap(&chunk_subset)?;
                let chunk_subset_bytes = self
                    .retrieve_chunk_subset_opt(
                        &chunk_indices,
                        &overlap.relative_to(chunk_subset.start())?,
                        options,
                    )?
                    .into_fixed()?;
                let output_subset = overlap.relative_to(array_subset.start())?;
                // chunks do not overlap, so the output regions are disjoint
                update_bytes_flen(
                    unsafe { output_slice.get() },
                    array_subset.shape(),
                    &chunk_subset_bytes,
                    &output_subset,
                    data_type_size,
                );
                Ok(())
            };
            if options.concurrent_target() > 1 {
                (0..chunks.num_elements())
                    .into_par_iter()
                    .try_for_each(|chunk_index| {
                        retrieve_chunk_into_output(chunk_indices_from_linear(chunks, chunk_index))
                    })?;
            } else {
                for chunk_indices in &chunks.indices() {
                    retrieve_chunk_into_output(chunk_indices)?;
                }
            }
        }
        unsafe { output.set_len(size_output) };
        Ok(ArrayBytes::new_flen(output))
    }

    fn retrieve_array_subset_vlen(
        &self,
        array_subset: &ArraySubset,
        chunks: &ArraySubset,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, ArrayError> {
        // decode in parallel, merge sequentially since offsets shift
        let retrieve_chunk = |chunk_indices: Vec<u64>| -> Result<_, ArrayError> {
            let chunk_subset = self.chunk_grid().chunk_subset(&chunk_indices)?;
            let overlap = array_subset.overlap(&chunk_subset)?;
            let bytes = self.retrieve_chunk_subset_opt(
                &chunk_indices,
                &overlap.relative_to(chunk_subset.start())?,
                options,
            )?;
            Ok((overlap.relative_to(array_subset.start())?, bytes))
        };
        let chunk_bytes: Vec<(ArraySubset, ArrayBytes)> = if options.concurrent_target() > 1 {
            (0..chunks.num_elements())
                .into_par_iter()
                .map(|chunk_index| retrieve_chunk(chunk_indices_from_linear(chunks, chunk_index)))
                .collect::<Result<_, _>>()?
        } else {
            chunks
                .indices()
                .into_iter()
                .map(retrieve_chunk)
                .collect::<Result<_, _>>()?
        };

        let mut output = ArrayBytes::new_fill_value(
            ArraySize::Variable {
                num_elements: array_subset.num_elements(),
            },
            self.fill_value(),
        );
        for (output_subset, bytes) in chunk_bytes {
            output = update_array_bytes(
                output,
                array_subset.shape(),
                &bytes,
                &output_subset,
                DataTypeSize::Variable,
            )?;
        }
        Ok(output)
    }
}

/// The ND indices of the `chunk_index`th chunk of the grid subset `chunks`.
pub(crate) fn chunk_indices_from_linear(chunks: &ArraySubset, chunk_index: u64) -> Vec<u64> {
    let indices = unravel_index(chunk_index, chunks.shape());
    std::iter::zip(indices, chunks.start())
        .map(|(index, start)| index + start)
        .collect()
}
