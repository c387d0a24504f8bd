//! The `zstd` bytes to bytes codec.

use serde::{Deserialize, Serialize};

use crate::array::array_representation::BytesRepresentation;
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{BytesToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecPlugin, CodecTraits};

/// The identifier of the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_zstd, create_codec_zstd)
}

fn is_name_zstd(name: &str) -> bool {
    name == IDENTIFIER
}

fn create_codec_zstd(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: ZstdCodecConfiguration = metadata.to_configuration()?;
    Ok(Codec::BytesToBytes(Box::new(ZstdCodec::new_with_configuration(
        &configuration,
    ))))
}

/// The configuration of the `zstd` codec.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZstdCodecConfiguration {
    /// The compression level.
    #[serde(default)]
    pub level: i32,
    /// Whether the encoded frame carries a content checksum.
    #[serde(default)]
    pub checksum: bool,
}

/// The `zstd` bytes to bytes codec.
#[derive(Copy, Clone, Debug)]
pub struct ZstdCodec {
    level: i32,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub const fn new(level: i32, checksum: bool) -> Self {
        Self { level, checksum }
    }

    /// Create a new `zstd` codec from a configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        Self {
            level: configuration.level,
            checksum: configuration.checksum,
        }
    }
}

impl CodecTraits for ZstdCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = ZstdCodecConfiguration {
            level: self.level,
            checksum: self.checksum,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("zstd configuration is serializable")
    }
}

impl BytesToBytesCodecTraits for ZstdCodec {
    fn encode(&self, bytes: Vec<u8>, _options: &CodecOptions) -> Result<Vec<u8>, CodecError> {
        let mut encoder = zstd::Encoder::new(Vec::new(), self.level)?;
        encoder.include_checksum(self.checksum)?;
        std::io::copy(&mut bytes.as_slice(), &mut encoder)?;
        Ok(encoder.finish()?)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(zstd::decode_all(bytes.as_slice())?)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation.size() {
            // upper bound from ZSTD_compressBound, plus 4 bytes when the frame
            // carries a content checksum
            Some(size) => {
                let margin = if size < 131_072 {
                    (131_072 - size) >> 11
                } else {
                    0
                };
                let bound = size + (size >> 8) + margin;
                BytesRepresentation::BoundedSize(bound + u64::from(self.checksum) * 4)
            }
            None => BytesRepresentation::UnboundedSize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zstd_codec_round_trip() {
        for checksum in [false, true] {
            let codec = ZstdCodec::new(5, checksum);
            let bytes: Vec<u8> = (0..64).map(|i| i % 7).collect();
            let encoded = codec.encode(bytes.clone(), &CodecOptions::default()).unwrap();
            let decoded = codec
                .decode(
                    encoded,
                    &BytesRepresentation::FixedSize(bytes.len() as u64),
                    &CodecOptions::default(),
                )
                .unwrap();
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn zstd_codec_corrupt() {
        let codec = ZstdCodec::new(1, false);
        let bytes: Vec<u8> = (0..64).collect();
        let mut encoded = codec.encode(bytes, &CodecOptions::default()).unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;
        encoded[0] ^= 0xff;
        assert!(codec
            .decode(
                encoded,
                &BytesRepresentation::FixedSize(64),
                &CodecOptions::default()
            )
            .is_err());
    }

    #[test]
    fn zstd_codec_metadata() {
        let metadata = ZstdCodec::new(3, true).create_metadata();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"zstd","configuration":{"level":3,"checksum":true}}"#
        );
    }
}
