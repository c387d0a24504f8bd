//! An array builder.

use std::sync::Arc;

use super::chunk_key_encoding::ChunkKeySeparator;
use super::codec::endian::EndianCodec;
use super::codec::vlen::VlenCodec;
use super::codec::{ArrayToBytesCodecTraits, BytesToBytesCodecTraits, CodecChain};
use super::data_type::{DataType, DataTypeSize};
use super::fill_value::FillValue;
use super::{Array, ArrayCreateError, ArrayMetadata, ArrayShape, ChunkShape};

/// An [`Array`] builder.
///
/// The builder defaults to the `endian` (little) array to bytes codec for
/// fixed-width data types and the `vlen` codec for variable-length data
/// types, with no bytes to bytes codecs.
///
/// ```
/// # use std::sync::Arc;
/// # use std::num::NonZeroU64;
/// use gridstore::array::{ArrayBuilder, DataType, FillValue};
/// use gridstore::storage::store::MemoryStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![8, 8],
///     DataType::Float32,
///     vec![NonZeroU64::new(4).unwrap(); 2],
///     FillValue::from(0.0f32),
/// )
/// .build(store, "/array")?;
/// array.store_metadata()?;
/// # Ok(())
/// # }
/// ```
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: ChunkShape,
    fill_value: FillValue,
    array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    chunk_key_separator: ChunkKeySeparator,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl ArrayBuilder {
    /// Create an array builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        let array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits> = match data_type.size() {
            DataTypeSize::Fixed(_) => Box::new(EndianCodec::little()),
            DataTypeSize::Variable => Box::<VlenCodec>::default(),
        };
        Self {
            shape,
            data_type,
            chunk_shape,
            fill_value,
            array_to_bytes_codec,
            bytes_to_bytes_codecs: Vec::new(),
            chunk_key_separator: ChunkKeySeparator::default(),
            attributes: serde_json::Map::new(),
        }
    }

    /// Set the array to bytes codec.
    pub fn array_to_bytes_codec(
        &mut self,
        array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the chunk key separator.
    pub fn chunk_key_separator(&mut self, chunk_key_separator: ChunkKeySeparator) -> &mut Self {
        self.chunk_key_separator = chunk_key_separator;
        self
    }

    /// Set the user attributes.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Build an [`Array`] at `path` in `storage`.
    ///
    /// The metadata document is not written; call
    /// [`store_metadata`](Array::store_metadata) to persist it.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the builder parameters are
    /// inconsistent.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        if !self.data_type.validate_fill_value(&self.fill_value) {
            return Err(super::array_representation::IncompatibleFillValueError::new(
                &self.data_type,
                &self.fill_value,
            )
            .into());
        }
        let codecs = CodecChain::new(
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );
        let metadata = ArrayMetadata::new(
            self.shape.clone(),
            self.data_type.identifier().to_string(),
            self.chunk_shape.clone(),
            self.data_type.metadata_fill_value(&self.fill_value),
            codecs.create_metadatas(),
        )
        .with_chunk_key_separator(self.chunk_key_separator)
        .with_attributes(self.attributes.clone());
        Array::new_with_metadata(storage, path, metadata)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn array_builder_defaults() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![8, 8],
            DataType::Float32,
            vec![NonZeroU64::new(4).unwrap(); 2],
            FillValue::from(0.0f32),
        )
        .build(store, "/array")
        .unwrap();
        assert_eq!(array.shape(), &[8, 8]);
        assert_eq!(array.chunk_grid_shape(), vec![2, 2]);
        assert_eq!(array.metadata().codecs.len(), 1);
    }

    #[test]
    fn array_builder_mismatched_dimensionality() {
        let store = Arc::new(MemoryStore::new());
        assert!(ArrayBuilder::new(
            vec![8, 8],
            DataType::Float32,
            vec![NonZeroU64::new(4).unwrap()],
            FillValue::from(0.0f32),
        )
        .build(store, "/array")
        .is_err());
    }

    #[test]
    fn array_builder_mismatched_fill_value() {
        let store = Arc::new(MemoryStore::new());
        assert!(ArrayBuilder::new(
            vec![8],
            DataType::Float32,
            vec![NonZeroU64::new(4).unwrap()],
            FillValue::from(0u8),
        )
        .build(store, "/array")
        .is_err());
    }
}
