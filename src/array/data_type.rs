//! Array data types.

use half::{bf16, f16};
use thiserror::Error;

use super::fill_value::{FillValue, FillValueFloat, FillValueMetadata};

/// The size of a data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataTypeSize {
    /// Fixed size in bytes per element.
    Fixed(usize),
    /// Variable size per element, carried through an offsets table.
    Variable,
}

/// An array data type.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` boolean.
    Bool,
    /// `int8` signed integer.
    Int8,
    /// `int16` signed integer.
    Int16,
    /// `int32` signed integer.
    Int32,
    /// `int64` signed integer.
    Int64,
    /// `uint8` unsigned integer.
    UInt8,
    /// `uint16` unsigned integer.
    UInt16,
    /// `uint32` unsigned integer.
    UInt32,
    /// `uint64` unsigned integer.
    UInt64,
    /// `float16` half precision float.
    Float16,
    /// `bfloat16` brain float.
    BFloat16,
    /// `float32` single precision float.
    Float32,
    /// `float64` double precision float.
    Float64,
    /// `bytes` variable-length byte sequences.
    Bytes,
    /// `string` variable-length UTF-8 strings.
    String,
}

/// An unsupported data type name.
#[derive(Clone, Debug, Error)]
#[error("data type {0} is not supported")]
pub struct UnsupportedDataTypeError(String);

/// Fill value metadata that does not match the data type.
#[derive(Clone, Debug, Error)]
#[error("fill value {1:?} is incompatible with data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadata);

impl DataType {
    /// The stable identifier of the data type.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::BFloat16 => "bfloat16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bytes => "bytes",
            Self::String => "string",
        }
    }

    /// Resolve a data type from its identifier.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] for an unknown identifier.
    pub fn from_identifier(identifier: &str) -> Result<Self, UnsupportedDataTypeError> {
        match identifier {
            "bool" => Ok(Self::Bool),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "float16" => Ok(Self::Float16),
            "bfloat16" => Ok(Self::BFloat16),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "bytes" => Ok(Self::Bytes),
            "string" => Ok(Self::String),
            _ => Err(UnsupportedDataTypeError(identifier.to_string())),
        }
    }

    /// The size of the data type.
    #[must_use]
    pub const fn size(&self) -> DataTypeSize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => DataTypeSize::Fixed(1),
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => DataTypeSize::Fixed(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => DataTypeSize::Fixed(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => DataTypeSize::Fixed(8),
            Self::Bytes | Self::String => DataTypeSize::Variable,
        }
    }

    /// The fixed size of the data type in bytes, or [`None`] for variable-length data types.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match self.size() {
            DataTypeSize::Fixed(size) => Some(size),
            DataTypeSize::Variable => None,
        }
    }

    /// Create a fill value from its metadata form.
    ///
    /// Integral metadata is accepted for float data types and widened/narrowed
    /// integral metadata is accepted where the value fits.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the metadata does not
    /// match the data type.
    pub fn fill_value_from_metadata(
        &self,
        metadata: &FillValueMetadata,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        let err =
            || IncompatibleFillValueMetadataError(self.identifier().to_string(), metadata.clone());
        match self {
            Self::Bool => match metadata {
                FillValueMetadata::Bool(bool) => Ok(FillValue::from(*bool)),
                _ => Err(err()),
            },
            Self::Int8 => int_fill_value::<i8>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::Int16 => int_fill_value::<i16>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::Int32 => int_fill_value::<i32>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::Int64 => int_fill_value::<i64>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::UInt8 => uint_fill_value::<u8>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::UInt16 => uint_fill_value::<u16>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::UInt32 => uint_fill_value::<u32>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::UInt64 => uint_fill_value::<u64>(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::Float16 => float_fill_value(metadata)
                .ok_or_else(err)
                .map(|float| FillValue::from(f16::from_f64(float))),
            Self::BFloat16 => float_fill_value(metadata)
                .ok_or_else(err)
                .map(|float| FillValue::from(bf16::from_f64(float))),
            Self::Float32 => float_fill_value(metadata)
                .ok_or_else(err)
                .map(|float| FillValue::from(float as f32)),
            Self::Float64 => float_fill_value(metadata)
                .ok_or_else(err)
                .map(FillValue::from),
            Self::String => match metadata {
                FillValueMetadata::String(string) => Ok(FillValue::from(string.as_str())),
                _ => Err(err()),
            },
            Self::Bytes => match metadata {
                FillValueMetadata::ByteArray(bytes) => Ok(FillValue::new(bytes.clone())),
                FillValueMetadata::String(string) => Ok(FillValue::from(string.as_str())),
                _ => Err(err()),
            },
        }
    }

    /// Create the metadata form of `fill_value`.
    ///
    /// # Panics
    /// Panics if the fill value size does not match the data type size;
    /// fill values are validated at array construction.
    #[must_use]
    pub fn metadata_fill_value(&self, fill_value: &FillValue) -> FillValueMetadata {
        let bytes = fill_value.as_ne_bytes();
        match self {
            Self::Bool => FillValueMetadata::Bool(bytes[0] != 0),
            Self::Int8 => {
                FillValueMetadata::Int(i64::from(i8::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::Int16 => {
                FillValueMetadata::Int(i64::from(i16::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::Int32 => {
                FillValueMetadata::Int(i64::from(i32::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::Int64 => FillValueMetadata::Int(i64::from_ne_bytes(bytes.try_into().unwrap())),
            Self::UInt8 => {
                FillValueMetadata::UInt(u64::from(u8::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::UInt16 => {
                FillValueMetadata::UInt(u64::from(u16::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::UInt32 => {
                FillValueMetadata::UInt(u64::from(u32::from_ne_bytes(bytes.try_into().unwrap())))
            }
            Self::UInt64 => FillValueMetadata::UInt(u64::from_ne_bytes(bytes.try_into().unwrap())),
            Self::Float16 => FillValueMetadata::Float(FillValueFloat::from_f64(
                f16::from_ne_bytes(bytes.try_into().unwrap()).to_f64(),
            )),
            Self::BFloat16 => FillValueMetadata::Float(FillValueFloat::from_f64(
                bf16::from_ne_bytes(bytes.try_into().unwrap()).to_f64(),
            )),
            Self::Float32 => FillValueMetadata::Float(FillValueFloat::from_f64(f64::from(
                f32::from_ne_bytes(bytes.try_into().unwrap()),
            ))),
            Self::Float64 => FillValueMetadata::Float(FillValueFloat::from_f64(f64::from_ne_bytes(
                bytes.try_into().unwrap(),
            ))),
            Self::String => {
                FillValueMetadata::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Self::Bytes => FillValueMetadata::ByteArray(bytes.to_vec()),
        }
    }

    /// Validate that `fill_value` matches the size of the data type.
    #[must_use]
    pub fn validate_fill_value(&self, fill_value: &FillValue) -> bool {
        match self.size() {
            DataTypeSize::Fixed(size) => fill_value.size() == size,
            DataTypeSize::Variable => true,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

fn int_fill_value<T: TryFrom<i64> + TryFrom<u64>>(metadata: &FillValueMetadata) -> Option<T> {
    match metadata {
        FillValueMetadata::Int(int) => T::try_from(*int).ok(),
        FillValueMetadata::UInt(uint) => T::try_from(*uint).ok(),
        _ => None,
    }
}

fn uint_fill_value<T: TryFrom<i64> + TryFrom<u64>>(metadata: &FillValueMetadata) -> Option<T> {
    int_fill_value(metadata)
}

#[allow(clippy::cast_precision_loss)]
fn float_fill_value(metadata: &FillValueMetadata) -> Option<f64> {
    match metadata {
        FillValueMetadata::Float(float) => Some(float.to_f64()),
        FillValueMetadata::Int(int) => Some(*int as f64),
        FillValueMetadata::UInt(uint) => Some(*uint as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_identifiers() {
        for identifier in [
            "bool", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
            "float16", "bfloat16", "float32", "float64", "bytes", "string",
        ] {
            let data_type = DataType::from_identifier(identifier).unwrap();
            assert_eq!(data_type.identifier(), identifier);
            assert_eq!(data_type.to_string(), identifier);
        }
        assert!(DataType::from_identifier("complex64").is_err());
    }

    #[test]
    fn data_type_sizes() {
        assert_eq!(DataType::Bool.fixed_size(), Some(1));
        assert_eq!(DataType::Float32.fixed_size(), Some(4));
        assert_eq!(DataType::UInt64.fixed_size(), Some(8));
        assert_eq!(DataType::String.fixed_size(), None);
        assert_eq!(DataType::String.size(), DataTypeSize::Variable);
    }

    #[test]
    fn fill_value_round_trips() {
        let cases: Vec<(DataType, FillValueMetadata)> = vec![
            (DataType::Bool, FillValueMetadata::Bool(true)),
            (DataType::Int16, FillValueMetadata::Int(-3)),
            (DataType::UInt32, FillValueMetadata::UInt(7)),
            (
                DataType::Float64,
                FillValueMetadata::Float(FillValueFloat::Float(0.5)),
            ),
            (
                DataType::String,
                FillValueMetadata::String("fill".to_string()),
            ),
            (DataType::Bytes, FillValueMetadata::ByteArray(vec![1, 2])),
        ];
        for (data_type, metadata) in cases {
            let fill_value = data_type.fill_value_from_metadata(&metadata).unwrap();
            assert_eq!(data_type.metadata_fill_value(&fill_value), metadata);
        }
    }

    #[test]
    fn fill_value_widening() {
        // an integral fill for a float data type
        let fill_value = DataType::Float32
            .fill_value_from_metadata(&FillValueMetadata::UInt(1))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(1.0f32));
        // NaN round trip
        let nan = DataType::Float32
            .fill_value_from_metadata(&FillValueMetadata::Float(FillValueFloat::from_f64(
                f64::NAN,
            )))
            .unwrap();
        assert!(f32::from_ne_bytes(nan.as_ne_bytes().try_into().unwrap()).is_nan());
    }

    #[test]
    fn fill_value_incompatible() {
        assert!(DataType::Bool
            .fill_value_from_metadata(&FillValueMetadata::Int(1))
            .is_err());
        assert!(DataType::Int8
            .fill_value_from_metadata(&FillValueMetadata::Int(1000))
            .is_err());
        assert!(DataType::String
            .fill_value_from_metadata(&FillValueMetadata::Bool(false))
            .is_err());
    }
}
