//! The `vlen` array to bytes codec.
//!
//! Encodes variable-length elements as a little-endian `u64` byte length of
//! the offsets table, the offsets table itself, then the concatenated element
//! bytes. The offsets table holds `num_elements + 1` offsets of the
//! configured index width; the trailing offset equals the data length.

use serde::{Deserialize, Serialize};

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::{BytesRepresentation, ChunkRepresentation};
use crate::array::data_type::DataTypeSize;
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{
    ArrayToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecPlugin, CodecTraits,
};

/// The identifier of the `vlen` codec.
pub const IDENTIFIER: &str = "vlen";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_vlen, create_codec_vlen)
}

fn is_name_vlen(name: &str) -> bool {
    name == IDENTIFIER
}

fn create_codec_vlen(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: VlenCodecConfiguration = metadata.to_configuration()?;
    Ok(Codec::ArrayToBytes(Box::new(VlenCodec::new(
        configuration.index_data_type,
    ))))
}

/// The width of the offsets in a `vlen` offsets table.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlenIndexDataType {
    /// 32-bit unsigned little-endian offsets.
    UInt32,
    /// 64-bit unsigned little-endian offsets.
    #[default]
    UInt64,
}

impl VlenIndexDataType {
    const fn size(self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }
}

/// The configuration of the `vlen` codec.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlenCodecConfiguration {
    /// The data type of the offsets table.
    #[serde(default)]
    pub index_data_type: VlenIndexDataType,
}

/// The `vlen` array to bytes codec.
#[derive(Copy, Clone, Debug, Default)]
pub struct VlenCodec {
    index_data_type: VlenIndexDataType,
}

impl VlenCodec {
    /// Create a new `vlen` codec.
    #[must_use]
    pub const fn new(index_data_type: VlenIndexDataType) -> Self {
        Self { index_data_type }
    }

    fn check_variable(
        decoded_representation: &ChunkRepresentation,
    ) -> Result<(), CodecError> {
        match decoded_representation.data_type_size() {
            DataTypeSize::Variable => Ok(()),
            DataTypeSize::Fixed(_) => Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER.to_string(),
            )),
        }
    }
}

impl CodecTraits for VlenCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = VlenCodecConfiguration {
            index_data_type: self.index_data_type,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("vlen configuration is serializable")
    }
}

impl ArrayToBytesCodecTraits for VlenCodec {
    fn encode(
        &self,
        bytes: ArrayBytes,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        Self::check_variable(decoded_representation)?;
        bytes.validate(
            decoded_representation.num_elements(),
            DataTypeSize::Variable,
        )?;
        let (data, offsets) = bytes.into_variable()?;

        let index_size = offsets.len() * self.index_data_type.size();
        let mut encoded = Vec::with_capacity(8 + index_size + data.len());
        encoded.extend_from_slice(&(index_size as u64).to_le_bytes());
        match self.index_data_type {
            VlenIndexDataType::UInt32 => {
                for &offset in &offsets {
                    let offset = u32::try_from(offset).map_err(|_| {
                        CodecError::from("chunk data too large for uint32 vlen offsets")
                    })?;
                    encoded.extend_from_slice(&offset.to_le_bytes());
                }
            }
            VlenIndexDataType::UInt64 => {
                for &offset in &offsets {
                    encoded.extend_from_slice(&(offset as u64).to_le_bytes());
                }
            }
        }
        encoded.extend_from_slice(&data);
        Ok(encoded)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes, CodecError> {
        Self::check_variable(decoded_representation)?;
        let num_elements = decoded_representation.num_elements_usize();

        if bytes.len() < 8 {
            return Err(CodecError::from("vlen chunk is shorter than its header"));
        }
        let index_size = u64::from_le_bytes(bytes[..8].try_into().unwrap());
        let index_size = usize::try_from(index_size)
            .map_err(|_| CodecError::from("vlen offsets table is too large"))?;
        let expected = (num_elements + 1) * self.index_data_type.size();
        if index_size != expected || bytes.len() < 8 + index_size {
            return Err(CodecError::InvalidVariableSizedArrayOffsets);
        }

        let index_bytes = &bytes[8..8 + index_size];
        let offsets: Vec<usize> = match self.index_data_type {
            VlenIndexDataType::UInt32 => index_bytes
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()) as usize)
                .collect(),
            VlenIndexDataType::UInt64 => index_bytes
                .chunks_exact(8)
                .map(|chunk| {
                    usize::try_from(u64::from_le_bytes(chunk.try_into().unwrap()))
                        .map_err(|_| CodecError::InvalidVariableSizedArrayOffsets)
                })
                .collect::<Result<_, _>>()?,
        };

        let data = bytes[8 + index_size..].to_vec();
        let decoded = ArrayBytes::new_vlen(data, offsets);
        decoded.validate(decoded_representation.num_elements(), DataTypeSize::Variable)?;
        Ok(decoded)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        Self::check_variable(decoded_representation)?;
        Ok(BytesRepresentation::UnboundedSize)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use crate::array::data_type::DataType;
    use crate::array::fill_value::FillValue;

    use super::*;

    fn representation(num_elements: u64) -> ChunkRepresentation {
        ChunkRepresentation::new(
            vec![NonZeroU64::new(num_elements).unwrap()],
            DataType::String,
            FillValue::new(vec![]),
        )
        .unwrap()
    }

    #[test]
    fn vlen_codec_round_trip() {
        for index_data_type in [VlenIndexDataType::UInt32, VlenIndexDataType::UInt64] {
            let codec = VlenCodec::new(index_data_type);
            let bytes = ArrayBytes::from_vlen_elements(&["a", "", "hello"]);
            let encoded = codec
                .encode(bytes.clone(), &representation(3), &CodecOptions::default())
                .unwrap();
            let decoded = codec
                .decode(encoded, &representation(3), &CodecOptions::default())
                .unwrap();
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn vlen_codec_layout() {
        let codec = VlenCodec::new(VlenIndexDataType::UInt32);
        let bytes = ArrayBytes::from_vlen_elements(&["ab", "c"]);
        let encoded = codec
            .encode(bytes, &representation(2), &CodecOptions::default())
            .unwrap();
        // 12 byte offsets table, offsets [0, 2, 3], then "abc"
        assert_eq!(
            encoded,
            vec![
                12, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, b'a', b'b', b'c'
            ]
        );
    }

    #[test]
    fn vlen_codec_invalid() {
        let codec = VlenCodec::default();
        assert!(codec
            .decode(vec![0; 4], &representation(1), &CodecOptions::default())
            .is_err());
        // truncated offsets table
        let mut encoded = 16u64.to_le_bytes().to_vec();
        encoded.extend_from_slice(&[0; 8]);
        assert!(codec
            .decode(encoded, &representation(1), &CodecOptions::default())
            .is_err());
    }
}
