//! In-memory array element bytes.
//!
//! [`ArrayBytes`] is the decoded form of a chunk or selection: a flat byte
//! buffer for fixed-width data types, or a byte buffer plus an explicit
//! offsets table for variable-length data types. The offsets table has one
//! entry per element plus a trailing entry equal to the byte length, and is
//! monotonically non-decreasing.

use itertools::Itertools;

use crate::array_subset::ArraySubset;
use crate::byte_range::extract_byte_ranges_concat_unchecked;

use super::codec::CodecError;
use super::data_type::{DataType, DataTypeSize};
use super::fill_value::FillValue;
use super::ravel_indices;

/// The element count and size classification of an array region.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArraySize {
    /// A fixed-width region.
    Fixed {
        /// The number of elements.
        num_elements: u64,
        /// The size in bytes per element.
        data_type_size: usize,
    },
    /// A variable-length region.
    Variable {
        /// The number of elements.
        num_elements: u64,
    },
}

impl ArraySize {
    /// Create a new [`ArraySize`] from a data type size and element count.
    #[must_use]
    pub const fn new(data_type_size: DataTypeSize, num_elements: u64) -> Self {
        match data_type_size {
            DataTypeSize::Fixed(data_type_size) => Self::Fixed {
                num_elements,
                data_type_size,
            },
            DataTypeSize::Variable => Self::Variable { num_elements },
        }
    }
}

/// Fixed or variable length array element bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArrayBytes {
    /// Bytes for a fixed-width array.
    Fixed(Vec<u8>),
    /// Bytes and element byte offsets for a variable-length array.
    Variable(Vec<u8>, Vec<usize>),
}

impl ArrayBytes {
    /// Create fixed-width array bytes from `bytes`.
    #[must_use]
    pub fn new_flen(bytes: Vec<u8>) -> Self {
        Self::Fixed(bytes)
    }

    /// Create variable-length array bytes from `bytes` and `offsets`.
    #[must_use]
    pub fn new_vlen(bytes: Vec<u8>, offsets: Vec<usize>) -> Self {
        Self::Variable(bytes, offsets)
    }

    /// Create array bytes composed entirely of the fill value.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn new_fill_value(array_size: ArraySize, fill_value: &FillValue) -> Self {
        match array_size {
            ArraySize::Fixed { num_elements, .. } => {
                let num_elements = usize::try_from(num_elements).unwrap();
                Self::new_flen(fill_value.as_ne_bytes().repeat(num_elements))
            }
            ArraySize::Variable { num_elements } => {
                let num_elements = usize::try_from(num_elements).unwrap();
                Self::new_vlen(
                    fill_value.as_ne_bytes().repeat(num_elements),
                    (0..=num_elements)
                        .map(|index| index * fill_value.size())
                        .collect(),
                )
            }
        }
    }

    /// Create variable-length array bytes from a sequence of elements.
    #[must_use]
    pub fn from_vlen_elements<T: AsRef<[u8]>>(elements: &[T]) -> Self {
        let mut bytes = Vec::with_capacity(
            elements.iter().map(|element| element.as_ref().len()).sum(),
        );
        let mut offsets = Vec::with_capacity(elements.len() + 1);
        for element in elements {
            offsets.push(bytes.len());
            bytes.extend_from_slice(element.as_ref());
        }
        offsets.push(bytes.len());
        Self::new_vlen(bytes, offsets)
    }

    /// Convert variable-length array bytes into per-element byte vectors.
    ///
    /// # Errors
    /// Returns [`CodecError::ExpectedVariableLengthBytes`] if the bytes are fixed-width.
    pub fn into_vlen_elements(self) -> Result<Vec<Vec<u8>>, CodecError> {
        let (bytes, offsets) = self.into_variable()?;
        Ok(offsets
            .iter()
            .tuple_windows()
            .map(|(&start, &end)| bytes[start..end].to_vec())
            .collect())
    }

    /// Convert into the flat bytes of a fixed-width array.
    ///
    /// # Errors
    /// Returns [`CodecError::ExpectedFixedLengthBytes`] if the bytes are variable-length.
    pub fn into_fixed(self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Fixed(bytes) => Ok(bytes),
            Self::Variable(..) => Err(CodecError::ExpectedFixedLengthBytes),
        }
    }

    /// Convert into the bytes and offsets of a variable-length array.
    ///
    /// # Errors
    /// Returns [`CodecError::ExpectedVariableLengthBytes`] if the bytes are fixed-width.
    pub fn into_variable(self) -> Result<(Vec<u8>, Vec<usize>), CodecError> {
        match self {
            Self::Fixed(_) => Err(CodecError::ExpectedVariableLengthBytes),
            Self::Variable(bytes, offsets) => Ok((bytes, offsets)),
        }
    }

    /// The size in bytes of the element bytes, excluding any offsets table.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Fixed(bytes) | Self::Variable(bytes, _) => bytes.len(),
        }
    }

    /// Returns true if every element equals the fill value.
    #[must_use]
    pub fn is_fill_value(&self, fill_value: &FillValue) -> bool {
        match self {
            Self::Fixed(bytes) => fill_value.equals_all(bytes),
            // element boundaries matter: one "abab" element is not two "ab" fills
            Self::Variable(bytes, offsets) => offsets
                .iter()
                .tuple_windows()
                .all(|(&start, &end)| &bytes[start..end] == fill_value.as_ne_bytes()),
        }
    }

    /// Validate the bytes against an element count and data type size.
    ///
    /// For fixed-width bytes the byte length must equal
    /// `num_elements * data_type_size`. For variable-length bytes the offsets
    /// table must have `num_elements + 1` monotonically non-decreasing
    /// entries ending at the byte length.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes are not valid.
    pub fn validate(
        &self,
        num_elements: u64,
        data_type_size: DataTypeSize,
    ) -> Result<(), CodecError> {
        match (self, data_type_size) {
            (Self::Fixed(bytes), DataTypeSize::Fixed(data_type_size)) => {
                let expected = num_elements * data_type_size as u64;
                if bytes.len() as u64 == expected {
                    Ok(())
                } else {
                    Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected))
                }
            }
            (Self::Variable(bytes, offsets), DataTypeSize::Variable) => {
                validate_offsets(bytes, offsets, num_elements)
            }
            (Self::Fixed(_), DataTypeSize::Variable) => Err(CodecError::ExpectedVariableLengthBytes),
            (Self::Variable(..), DataTypeSize::Fixed(_)) => {
                Err(CodecError::ExpectedFixedLengthBytes)
            }
        }
    }

    /// Extract the elements of `subset` from array bytes of `array_shape`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `array_shape` does not encapsulate `subset`.
    ///
    /// # Panics
    /// Panics if indices in the subset exceed [`usize::MAX`].
    pub fn extract_array_subset(
        &self,
        subset: &ArraySubset,
        array_shape: &[u64],
        data_type: &DataType,
    ) -> Result<ArrayBytes, CodecError> {
        match self {
            Self::Fixed(bytes) => {
                let element_size = data_type
                    .fixed_size()
                    .ok_or(CodecError::ExpectedVariableLengthBytes)?;
                let byte_ranges = subset.byte_ranges(array_shape, element_size)?;
                let bytes = unsafe { extract_byte_ranges_concat_unchecked(bytes, &byte_ranges) };
                Ok(ArrayBytes::new_flen(bytes))
            }
            Self::Variable(bytes, offsets) => {
                let indices = subset.linearised_indices(array_shape)?;
                let mut ss_bytes = Vec::new();
                let mut ss_offsets = Vec::with_capacity(indices.len() + 1);
                for index in &indices {
                    let index = usize::try_from(index).unwrap();
                    ss_offsets.push(ss_bytes.len());
                    ss_bytes.extend_from_slice(&bytes[offsets[index]..offsets[index + 1]]);
                }
                ss_offsets.push(ss_bytes.len());
                Ok(ArrayBytes::new_vlen(ss_bytes, ss_offsets))
            }
        }
    }
}

fn validate_offsets(
    bytes: &[u8],
    offsets: &[usize],
    num_elements: u64,
) -> Result<(), CodecError> {
    if offsets.len() as u64 != num_elements + 1 {
        return Err(CodecError::InvalidVariableSizedArrayOffsets);
    }
    let mut last = 0;
    for &offset in offsets {
        if offset < last || offset > bytes.len() {
            return Err(CodecError::InvalidVariableSizedArrayOffsets);
        }
        last = offset;
    }
    if last == bytes.len() {
        Ok(())
    } else {
        Err(CodecError::InvalidVariableSizedArrayOffsets)
    }
}

/// Overlay fixed-width `subset_bytes` into `output_bytes` at `subset` of an
/// array of `output_shape`.
///
/// # Panics
/// Panics if `subset` is not encapsulated by `output_shape` or the buffer
/// sizes disagree with the shapes; callers validate first.
pub fn update_bytes_flen(
    output_bytes: &mut [u8],
    output_shape: &[u64],
    subset_bytes: &[u8],
    subset: &ArraySubset,
    data_type_size: usize,
) {
    debug_assert_eq!(
        output_bytes.len() as u64,
        output_shape.iter().product::<u64>() * data_type_size as u64
    );
    debug_assert_eq!(
        subset_bytes.len(),
        subset.num_elements_usize() * data_type_size
    );

    let contiguous = subset
        .contiguous_linearised_indices(output_shape)
        .expect("subset is validated against the output shape");
    let length = usize::try_from(contiguous.contiguous_elements()).unwrap() * data_type_size;
    let mut subset_offset = 0;
    for (output_index, _) in &contiguous {
        let output_offset = usize::try_from(output_index).unwrap() * data_type_size;
        output_bytes[output_offset..output_offset + length]
            .copy_from_slice(&subset_bytes[subset_offset..subset_offset + length]);
        subset_offset += length;
    }
}

fn update_bytes_vlen(
    output_bytes: &[u8],
    output_offsets: &[usize],
    output_shape: &[u64],
    subset_bytes: &[u8],
    subset_offsets: &[usize],
    subset: &ArraySubset,
) -> ArrayBytes {
    // Rebuild the buffer element by element; offsets shift when element sizes change.
    let mut offsets_new = Vec::with_capacity(output_offsets.len());
    let mut bytes_new = Vec::new();
    for (output_index, indices) in ArraySubset::new_with_shape(output_shape.to_vec())
        .indices()
        .into_iter()
        .enumerate()
    {
        offsets_new.push(bytes_new.len());
        if subset.contains(&indices) {
            let relative: Vec<u64> = std::iter::zip(&indices, subset.start())
                .map(|(index, start)| index - start)
                .collect();
            let subset_index =
                usize::try_from(ravel_indices(&relative, subset.shape())).unwrap();
            bytes_new.extend_from_slice(
                &subset_bytes[subset_offsets[subset_index]..subset_offsets[subset_index + 1]],
            );
        } else {
            bytes_new
                .extend_from_slice(&output_bytes[output_offsets[output_index]..output_offsets[output_index + 1]]);
        }
    }
    offsets_new.push(bytes_new.len());
    ArrayBytes::new_vlen(bytes_new, offsets_new)
}

/// Overlay `subset_bytes` into `output_bytes` at `subset` of an array of
/// `output_shape`, returning the updated array bytes.
///
/// # Errors
/// Returns a [`CodecError`] if the fixed/variable kinds of the inputs and
/// `data_type_size` disagree.
pub fn update_array_bytes(
    output_bytes: ArrayBytes,
    output_shape: &[u64],
    subset_bytes: &ArrayBytes,
    subset: &ArraySubset,
    data_type_size: DataTypeSize,
) -> Result<ArrayBytes, CodecError> {
    match (output_bytes, subset_bytes, data_type_size) {
        (
            ArrayBytes::Fixed(mut output_bytes),
            ArrayBytes::Fixed(subset_bytes),
            DataTypeSize::Fixed(data_type_size),
        ) => {
            update_bytes_flen(
                &mut output_bytes,
                output_shape,
                subset_bytes,
                subset,
                data_type_size,
            );
            Ok(ArrayBytes::new_flen(output_bytes))
        }
        (
            ArrayBytes::Variable(output_bytes, output_offsets),
            ArrayBytes::Variable(subset_bytes, subset_offsets),
            DataTypeSize::Variable,
        ) => Ok(update_bytes_vlen(
            &output_bytes,
            &output_offsets,
            output_shape,
            subset_bytes,
            subset_offsets,
            subset,
        )),
        (ArrayBytes::Fixed(_), _, _) => Err(CodecError::ExpectedVariableLengthBytes),
        (ArrayBytes::Variable(..), _, _) => Err(CodecError::ExpectedFixedLengthBytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_bytes_fill_value() {
        let bytes = ArrayBytes::new_fill_value(
            ArraySize::new(DataTypeSize::Fixed(2), 3),
            &FillValue::from(1u16),
        );
        assert_eq!(bytes.size(), 6);
        assert!(bytes.is_fill_value(&FillValue::from(1u16)));

        let bytes = ArrayBytes::new_fill_value(
            ArraySize::new(DataTypeSize::Variable, 2),
            &FillValue::from("ab"),
        );
        assert_eq!(
            bytes,
            ArrayBytes::new_vlen(b"abab".to_vec(), vec![0, 2, 4])
        );
    }

    #[test]
    fn array_bytes_vlen_fill_value_boundaries() {
        let fill = FillValue::from("ab");
        assert!(ArrayBytes::from_vlen_elements(&["ab", "ab"]).is_fill_value(&fill));
        // concatenated bytes tile the fill value but the elements differ
        assert!(!ArrayBytes::from_vlen_elements(&["abab"]).is_fill_value(&fill));
        assert!(!ArrayBytes::from_vlen_elements(&["ab", "a", "b"]).is_fill_value(&fill));

        let empty_fill = FillValue::from("");
        assert!(ArrayBytes::from_vlen_elements(&["", ""]).is_fill_value(&empty_fill));
        assert!(!ArrayBytes::from_vlen_elements(&["", "x"]).is_fill_value(&empty_fill));
    }

    #[test]
    fn array_bytes_vlen_elements() {
        let bytes = ArrayBytes::from_vlen_elements(&["a", "", "bcd"]);
        assert_eq!(bytes, ArrayBytes::new_vlen(b"abcd".to_vec(), vec![0, 1, 1, 4]));
        assert_eq!(
            bytes.into_vlen_elements().unwrap(),
            vec![b"a".to_vec(), vec![], b"bcd".to_vec()]
        );
    }

    #[test]
    fn array_bytes_validate() {
        let bytes = ArrayBytes::new_flen(vec![0; 8]);
        assert!(bytes.validate(4, DataTypeSize::Fixed(2)).is_ok());
        assert!(bytes.validate(3, DataTypeSize::Fixed(2)).is_err());
        assert!(bytes.validate(4, DataTypeSize::Variable).is_err());

        let bytes = ArrayBytes::new_vlen(vec![0; 4], vec![0, 2, 4]);
        assert!(bytes.validate(2, DataTypeSize::Variable).is_ok());
        assert!(bytes.validate(3, DataTypeSize::Variable).is_err());
        let bytes = ArrayBytes::new_vlen(vec![0; 4], vec![2, 0, 4]);
        assert!(bytes.validate(2, DataTypeSize::Variable).is_err());
        let bytes = ArrayBytes::new_vlen(vec![0; 4], vec![0, 2, 3]);
        assert!(bytes.validate(2, DataTypeSize::Variable).is_err());
    }

    #[test]
    fn array_bytes_extract_fixed() {
        // 4x4 u8 array holding 0..16
        let bytes = ArrayBytes::new_flen((0u8..16).collect());
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let extracted = bytes
            .extract_array_subset(&subset, &[4, 4], &DataType::UInt8)
            .unwrap();
        assert_eq!(extracted, ArrayBytes::new_flen(vec![5, 6, 9, 10]));
    }

    #[test]
    fn array_bytes_extract_vlen() {
        let bytes = ArrayBytes::from_vlen_elements(&["a", "bb", "ccc", "dddd"]);
        let subset = ArraySubset::new_with_ranges(&[0..2, 1..2]);
        let extracted = bytes
            .extract_array_subset(&subset, &[2, 2], &DataType::String)
            .unwrap();
        assert_eq!(
            extracted.into_vlen_elements().unwrap(),
            vec![b"bb".to_vec(), b"dddd".to_vec()]
        );
    }

    #[test]
    fn array_bytes_update_fixed() {
        let output = ArrayBytes::new_flen(vec![0u8; 16]);
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let updated = update_array_bytes(
            output,
            &[4, 4],
            &ArrayBytes::new_flen(vec![5, 6, 9, 10]),
            &subset,
            DataTypeSize::Fixed(1),
        )
        .unwrap();
        assert_eq!(
            updated,
            ArrayBytes::new_flen(vec![0, 0, 0, 0, 0, 5, 6, 0, 0, 9, 10, 0, 0, 0, 0, 0])
        );
    }

    #[test]
    fn array_bytes_update_vlen() {
        let output = ArrayBytes::from_vlen_elements(&["a", "bb", "ccc", "dddd"]);
        let subset = ArraySubset::new_with_ranges(&[0..2, 0..1]);
        let updated = update_array_bytes(
            output,
            &[2, 2],
            &ArrayBytes::from_vlen_elements(&["xxxxx", ""]),
            &subset,
            DataTypeSize::Variable,
        )
        .unwrap();
        assert_eq!(
            updated.into_vlen_elements().unwrap(),
            vec![b"xxxxx".to_vec(), b"bb".to_vec(), vec![], b"dddd".to_vec()]
        );
    }
}
