//! Array errors.

use thiserror::Error;

use crate::array_subset::{
    ArraySubset, IncompatibleArraySubsetAndShapeError, IncompatibleDimensionalityError,
};
use crate::plugin::PluginCreateError;
use crate::storage::StorageError;

use super::array_metadata::ArrayMetadataError;
use super::array_representation::IncompatibleFillValueError;
use super::codec::CodecError;
use super::data_type::{IncompatibleFillValueMetadataError, UnsupportedDataTypeError};

/// An array creation or opening error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// The metadata document is missing from the store.
    #[error("array metadata is missing at {0}")]
    MissingMetadata(String),
    /// The metadata document is invalid.
    #[error(transparent)]
    ArrayMetadataError(#[from] ArrayMetadataError),
    /// The node path is invalid.
    #[error(transparent)]
    NodePathError(#[from] crate::node_path::NodePathError),
    /// The data type is not supported.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnsupportedDataTypeError),
    /// The fill value metadata is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// The fill value is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// The codec chain could not be created.
    #[error("codec chain creation failed: {0}")]
    CodecsCreateError(#[from] PluginCreateError),
    /// The chunk grid is incompatible with the array shape.
    #[error(transparent)]
    InvalidChunkGrid(#[from] IncompatibleDimensionalityError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// An array operation error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Chunk indices are outside the chunk grid.
    #[error("chunk indices {0:?} are outside the chunk grid")]
    InvalidChunkGridIndices(Vec<u64>),
    /// An array subset is outside the array bounds.
    #[error("array subset {0} is outside the array of shape {1:?}")]
    InvalidArraySubset(ArraySubset, Vec<u64>),
    /// A chunk subset is outside a chunk.
    #[error("chunk subset {0} is outside the chunk of shape {1:?}")]
    InvalidChunkSubset(ArraySubset, Vec<u64>),
    /// The dimensionality of indices or a subset does not match the array.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An array subset is incompatible with an array shape.
    #[error(transparent)]
    IncompatibleArraySubsetAndShape(#[from] IncompatibleArraySubsetAndShapeError),
    /// Input bytes do not match the expected size of their destination.
    #[error("input bytes have length {0}, expected {1}")]
    InvalidBytesInputSize(usize, u64),
    /// The element type size does not match the data type size.
    #[error("element size {0} does not match data type size {1}")]
    IncompatibleElementSize(usize, usize),
    /// The data type does not support a typed element view.
    #[error("data type {0} does not support this element type")]
    IncompatibleElementType(String),
}
