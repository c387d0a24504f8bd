//! The `endian` array to bytes codec.
//!
//! Lays out the elements of a fixed-width chunk in lexicographical row-major
//! order with a configured byte order.

use serde::{Deserialize, Serialize};

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::{BytesRepresentation, ChunkRepresentation};
use crate::array::data_type::DataTypeSize;
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{
    ArrayToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecPlugin, CodecTraits,
};

/// The identifier of the `endian` codec.
pub const IDENTIFIER: &str = "endian";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_endian, create_codec_endian)
}

fn is_name_endian(name: &str) -> bool {
    name == IDENTIFIER
}

fn create_codec_endian(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: EndianCodecConfiguration = metadata.to_configuration()?;
    Ok(Codec::ArrayToBytes(Box::new(EndianCodec::new(
        configuration.endian,
    ))))
}

/// A byte order.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Returns true if this is the native byte order of the target.
    #[must_use]
    pub fn is_native(self) -> bool {
        (self == Self::Little && cfg!(target_endian = "little"))
            || (self == Self::Big && cfg!(target_endian = "big"))
    }
}

/// The configuration of the `endian` codec.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndianCodecConfiguration {
    /// The byte order of the encoded elements.
    pub endian: Endianness,
}

/// The `endian` array to bytes codec.
#[derive(Copy, Clone, Debug)]
pub struct EndianCodec {
    endian: Endianness,
}

impl EndianCodec {
    /// Create a new `endian` codec.
    #[must_use]
    pub const fn new(endian: Endianness) -> Self {
        Self { endian }
    }

    /// Create a new little-endian `endian` codec.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Endianness::Little)
    }

    fn fixed_element_size(
        decoded_representation: &ChunkRepresentation,
    ) -> Result<usize, CodecError> {
        match decoded_representation.data_type_size() {
            DataTypeSize::Fixed(size) => Ok(size),
            DataTypeSize::Variable => Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER.to_string(),
            )),
        }
    }
}

/// Reverse the byte order of every `element_size` sized element of `bytes`.
fn reverse_endianness(bytes: &mut [u8], element_size: usize) {
    if element_size > 1 {
        for element in bytes.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}

impl CodecTraits for EndianCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = EndianCodecConfiguration {
            endian: self.endian,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("endian configuration is serializable")
    }
}

impl ArrayToBytesCodecTraits for EndianCodec {
    fn encode(
        &self,
        bytes: ArrayBytes,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let element_size = Self::fixed_element_size(decoded_representation)?;
        bytes.validate(
            decoded_representation.num_elements(),
            decoded_representation.data_type_size(),
        )?;
        let mut bytes = bytes.into_fixed()?;
        if !self.endian.is_native() {
            reverse_endianness(&mut bytes, element_size);
        }
        Ok(bytes)
    }

    fn decode(
        &self,
        mut bytes: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<ArrayBytes, CodecError> {
        let element_size = Self::fixed_element_size(decoded_representation)?;
        let expected = decoded_representation.num_elements() * element_size as u64;
        if bytes.len() as u64 != expected {
            return Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected));
        }
        if !self.endian.is_native() {
            reverse_endianness(&mut bytes, element_size);
        }
        Ok(ArrayBytes::new_flen(bytes))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let element_size = Self::fixed_element_size(decoded_representation)?;
        Ok(BytesRepresentation::FixedSize(
            decoded_representation.num_elements() * element_size as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use crate::array::data_type::DataType;
    use crate::array::fill_value::FillValue;

    use super::*;

    fn representation() -> ChunkRepresentation {
        ChunkRepresentation::new(
            vec![NonZeroU64::new(2).unwrap()],
            DataType::UInt16,
            FillValue::from(0u16),
        )
        .unwrap()
    }

    #[test]
    fn endian_codec_little() {
        let codec = EndianCodec::little();
        let bytes = ArrayBytes::new_flen(
            [0x0102u16, 0x0304]
                .iter()
                .flat_map(|value| value.to_ne_bytes())
                .collect(),
        );
        let encoded = codec
            .encode(bytes.clone(), &representation(), &CodecOptions::default())
            .unwrap();
        assert_eq!(encoded, vec![0x02, 0x01, 0x04, 0x03]);
        let decoded = codec
            .decode(encoded, &representation(), &CodecOptions::default())
            .unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn endian_codec_big() {
        let codec = EndianCodec::new(Endianness::Big);
        let bytes = ArrayBytes::new_flen(
            [0x0102u16, 0x0304]
                .iter()
                .flat_map(|value| value.to_ne_bytes())
                .collect(),
        );
        let encoded = codec
            .encode(bytes.clone(), &representation(), &CodecOptions::default())
            .unwrap();
        assert_eq!(encoded, vec![0x01, 0x02, 0x03, 0x04]);
        let decoded = codec
            .decode(encoded, &representation(), &CodecOptions::default())
            .unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn endian_codec_invalid_size() {
        let codec = EndianCodec::little();
        assert!(codec
            .decode(vec![0; 3], &representation(), &CodecOptions::default())
            .is_err());
    }

    #[test]
    fn endian_codec_metadata() {
        let metadata = EndianCodec::new(Endianness::Big).create_metadata();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"endian","configuration":{"endian":"big"}}"#
        );
        assert!(matches!(
            Codec::from_metadata(&metadata).unwrap(),
            Codec::ArrayToBytes(_)
        ));
    }
}
