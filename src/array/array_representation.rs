//! Chunk and byte representations: the context codecs need.

use std::num::NonZeroU64;

use thiserror::Error;

use super::data_type::{DataType, DataTypeSize};
use super::fill_value::FillValue;

/// The size and layout context of a decoded chunk.
///
/// Carries the chunk shape, data type, and fill value needed by shape-aware
/// codecs; the shape is non-zero in every dimension.
#[derive(Clone, Debug)]
pub struct ChunkRepresentation {
    shape: Vec<NonZeroU64>,
    data_type: DataType,
    fill_value: FillValue,
}

/// A fill value that does not match the size of a data type.
#[derive(Clone, Debug, Error)]
#[error("fill value of {1} bytes is incompatible with data type {0}")]
pub struct IncompatibleFillValueError(String, usize);

impl IncompatibleFillValueError {
    /// Create a new [`IncompatibleFillValueError`].
    #[must_use]
    pub fn new(data_type: &DataType, fill_value: &FillValue) -> Self {
        Self(data_type.identifier().to_string(), fill_value.size())
    }
}

impl ChunkRepresentation {
    /// Create a new chunk representation.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the fill value size does not
    /// match the data type size.
    pub fn new(
        shape: Vec<NonZeroU64>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        if data_type.validate_fill_value(&fill_value) {
            Ok(Self {
                shape,
                data_type,
                fill_value,
            })
        } else {
            Err(IncompatibleFillValueError::new(&data_type, &fill_value))
        }
    }

    /// The chunk shape.
    #[must_use]
    pub fn shape(&self) -> &[NonZeroU64] {
        &self.shape
    }

    /// The chunk shape with plain `u64` extents.
    #[must_use]
    pub fn shape_u64(&self) -> Vec<u64> {
        self.shape.iter().map(|size| size.get()).collect()
    }

    /// The dimensionality of the chunk.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// The number of elements in the chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().map(|size| size.get()).product()
    }

    /// The number of elements in the chunk as a `usize`.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// The data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// The fixed size in bytes of the decoded chunk, or [`None`] for
    /// variable-length data types.
    #[must_use]
    pub fn fixed_element_size(&self) -> Option<usize> {
        self.data_type.fixed_size()
    }

    /// The size of the data type.
    #[must_use]
    pub const fn data_type_size(&self) -> DataTypeSize {
        self.data_type.size()
    }
}

/// The size bound of an encoded chunk.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BytesRepresentation {
    /// The exact size in bytes.
    FixedSize(u64),
    /// An upper bound on the size in bytes.
    BoundedSize(u64),
    /// No size bound.
    UnboundedSize,
}

impl BytesRepresentation {
    /// The exact or bounded size in bytes, or [`None`] if unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_representation() {
        let representation = ChunkRepresentation::new(
            vec![NonZeroU64::new(2).unwrap(), NonZeroU64::new(3).unwrap()],
            DataType::Float32,
            FillValue::from(0.0f32),
        )
        .unwrap();
        assert_eq!(representation.num_elements(), 6);
        assert_eq!(representation.shape_u64(), vec![2, 3]);
        assert_eq!(representation.fixed_element_size(), Some(4));

        assert!(ChunkRepresentation::new(
            vec![NonZeroU64::new(2).unwrap()],
            DataType::Float32,
            FillValue::from(0u8),
        )
        .is_err());
    }
}
