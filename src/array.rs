//! Arrays: chunked, compressed, self-describing multidimensional collections
//! of elements.
//!
//! An [`Array`] is defined by its metadata document (see
//! [`ArrayMetadata`](array_metadata::ArrayMetadata)) and its chunks, all
//! stored under a node path in a store. Reads of regions no chunk has been
//! written for return the fill value; writes spanning partial chunks
//! read-modify-write the affected chunks.

pub mod array_builder;
pub mod array_bytes;
pub mod array_errors;
pub mod array_metadata;
pub mod array_representation;
pub mod chunk_grid;
pub mod chunk_key_encoding;
pub mod codec;
pub mod data_type;
pub mod fill_value;

mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;
mod unsafe_cell_slice;

pub use array_builder::ArrayBuilder;
pub use array_bytes::{ArrayBytes, ArraySize};
pub use array_errors::{ArrayCreateError, ArrayError};
pub use array_metadata::{ArrayMetadata, ArrayMetadataError};
pub use array_representation::{BytesRepresentation, ChunkRepresentation};
pub use chunk_grid::RegularChunkGrid;
pub use chunk_key_encoding::{ChunkKeyEncoding, ChunkKeySeparator};
pub use data_type::{DataType, DataTypeSize};
pub use fill_value::{FillValue, FillValueMetadata};

pub(crate) use unsafe_cell_slice::UnsafeCellSlice;

use core::mem::size_of;
use std::num::NonZeroU64;
use std::sync::Arc;

use crate::array_subset::ArraySubset;
use crate::metadata::AdditionalFields;
use crate::node_path::NodePath;
use crate::storage::{data_key, meta_key, StoreKey};

use codec::CodecChain;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// The indices of an element or chunk.
pub type ArrayIndices = Vec<u64>;

/// The shape of a chunk, non-zero in every dimension.
pub type ChunkShape = Vec<NonZeroU64>;

/// Ravel ND `indices` into a linearised index within an array of `shape`,
/// with the last dimension varying fastest.
///
/// # Panics
/// Panics if the lengths of `indices` and `shape` differ.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    assert_eq!(indices.len(), shape.len());
    let mut index = 0;
    for (i, s) in std::iter::zip(indices, shape) {
        index = index * s + i;
    }
    index
}

/// Unravel a linearised `index` into ND indices within an array of `shape`,
/// with the last dimension varying fastest.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices, size) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices = index % size;
        index /= size;
    }
    indices
}

/// Convert a byte vector to a vector of elements, reusing the allocation
/// where the layout permits.
#[must_use]
pub fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::cast_slice(&from).to_vec())
}

/// Convert a vector of elements to a byte vector, reusing the allocation
/// where the layout permits.
#[must_use]
pub fn transmute_to_bytes_vec<T: bytemuck::NoUninit>(from: Vec<T>) -> Vec<u8> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::cast_slice(&from).to_vec())
}

/// A chunked, compressed, self-describing multidimensional array.
///
/// The generic storage parameter is usually an [`Arc`] of a store
/// implementing the storage traits required by the operations used; read
/// operations need [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits),
/// write operations [`WritableStorageTraits`](crate::storage::WritableStorageTraits),
/// and partial writes both.
#[derive(Clone, Debug)]
pub struct Array<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    shape: ArrayShape,
    data_type: DataType,
    chunk_grid: RegularChunkGrid,
    chunk_key_encoding: ChunkKeyEncoding,
    fill_value: FillValue,
    codecs: CodecChain,
    attributes: serde_json::Map<String, serde_json::Value>,
    additional_fields: AdditionalFields,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array from `metadata` at `path` in `storage`.
    ///
    /// This validates the metadata but does not write it; use
    /// [`store_metadata`](Array::store_metadata) to persist a new array.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the metadata is invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        crate::metadata::validate_additional_fields(&metadata.additional_fields)
            .map_err(ArrayMetadataError::UnknownRequiredField)?;
        let data_type = DataType::from_identifier(&metadata.data_type)?;
        let fill_value = data_type.fill_value_from_metadata(&metadata.fill_value)?;
        let codecs = CodecChain::from_metadata(&metadata.codecs)?;
        let chunk_grid = RegularChunkGrid::new(metadata.chunk_shape.clone());
        // the chunk grid dimensionality must match the array shape
        chunk_grid.grid_shape(&metadata.shape)?;
        let path = NodePath::try_from(path)?;
        Ok(Self {
            storage,
            path,
            shape: metadata.shape,
            data_type,
            chunk_grid,
            chunk_key_encoding: ChunkKeyEncoding::new(metadata.chunk_key_separator),
            fill_value,
            codecs,
            attributes: metadata.attributes,
            additional_fields: metadata.additional_fields,
        })
    }

    /// The node path of the array.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// The shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// The data type of the array.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The fill value of the array.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// The chunk grid of the array.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// The chunk key encoding of the array.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// The codec chain of the array.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// The user attributes of the array.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Mutate the user attributes of the array.
    ///
    /// Call [`store_metadata`](Array::store_metadata) to persist the change.
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.attributes
    }

    /// Set the shape of the array.
    ///
    /// Shrinking does not erase chunks outside the new bounds; they become
    /// unreachable and reappear if the array grows again. Call
    /// [`store_metadata`](Array::store_metadata) to persist the change.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleDimensionality`] if the
    /// dimensionality of `shape` differs from the array.
    pub fn set_shape(&mut self, shape: ArrayShape) -> Result<(), ArrayError> {
        if shape.len() == self.dimensionality() {
            self.shape = shape;
            Ok(())
        } else {
            Err(crate::array_subset::IncompatibleDimensionalityError::new(
                shape.len(),
                self.dimensionality(),
            )
            .into())
        }
    }

    /// Reconstruct the metadata document of the array.
    #[must_use]
    pub fn metadata(&self) -> ArrayMetadata {
        let mut metadata = ArrayMetadata::new(
            self.shape.clone(),
            self.data_type.identifier().to_string(),
            self.chunk_grid.chunk_shape().to_vec(),
            self.data_type.metadata_fill_value(&self.fill_value),
            self.codecs.create_metadatas(),
        )
        .with_chunk_key_separator(self.chunk_key_encoding.separator())
        .with_attributes(self.attributes.clone());
        metadata.additional_fields = self.additional_fields.clone();
        metadata
    }

    /// The store key of the metadata document.
    #[must_use]
    pub fn meta_key(&self) -> StoreKey {
        meta_key(&self.path)
    }

    /// The store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(&self.path, &self.chunk_key_encoding.encode(chunk_indices))
    }

    /// The shape of the chunk grid.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        self.chunk_grid
            .grid_shape(&self.shape)
            .expect("the chunk grid dimensionality matches the array")
    }

    /// Returns true if `chunk_indices` lie within the chunk grid.
    #[must_use]
    pub fn chunk_indices_inbounds(&self, chunk_indices: &[u64]) -> bool {
        let grid_shape = self.chunk_grid_shape();
        chunk_indices.len() == grid_shape.len()
            && std::iter::zip(chunk_indices, grid_shape).all(|(&index, extent)| index < extent)
    }

    /// The subset of the array covered by the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` are
    /// outside the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        if self.chunk_indices_inbounds(chunk_indices) {
            Ok(self.chunk_grid.chunk_subset(chunk_indices)?)
        } else {
            Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
        }
    }

    /// The representation of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` are
    /// outside the chunk grid.
    pub fn chunk_representation(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ChunkRepresentation, ArrayError> {
        if self.chunk_indices_inbounds(chunk_indices) {
            Ok(ChunkRepresentation::new(
                self.chunk_grid.chunk_shape().to_vec(),
                self.data_type.clone(),
                self.fill_value.clone(),
            )
            .expect("the array fill value matches its data type"))
        } else {
            Err(ArrayError::InvalidChunkGridIndices(chunk_indices.to_vec()))
        }
    }

    /// Validate that `array_subset` lies within the array bounds.
    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.dimensionality() == self.dimensionality()
            && array_subset.inbounds(&self.shape)
        {
            Ok(())
        } else {
            Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape.clone(),
            ))
        }
    }

    /// Validate fixed-width element input of `T` against the data type.
    fn validate_element_size<T>(&self) -> Result<usize, ArrayError> {
        match self.data_type.size() {
            DataTypeSize::Fixed(data_type_size) if data_type_size == size_of::<T>() => {
                Ok(data_type_size)
            }
            DataTypeSize::Fixed(data_type_size) => Err(ArrayError::IncompatibleElementSize(
                size_of::<T>(),
                data_type_size,
            )),
            DataTypeSize::Variable => Err(ArrayError::IncompatibleElementType(
                self.data_type.identifier().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ravel_unravel() {
        assert_eq!(ravel_indices(&[1, 2], &[3, 4]), 6);
        assert_eq!(unravel_index(6, &[3, 4]), vec![1, 2]);
        assert_eq!(ravel_indices(&[2, 3], &[3, 4]), 11);
        assert_eq!(unravel_index(0, &[3, 4]), vec![0, 0]);
    }

    #[test]
    fn transmute_vecs() {
        let elements = vec![1.0f32, 2.0];
        let bytes = transmute_to_bytes_vec(elements.clone());
        assert_eq!(bytes.len(), 8);
        assert_eq!(transmute_from_bytes_vec::<f32>(bytes), elements);
    }
}
