//! The `gzip` bytes to bytes codec.

use std::io::{Read, Write};

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::array_representation::BytesRepresentation;
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{BytesToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecPlugin, CodecTraits};

/// The identifier of the `gzip` codec.
pub const IDENTIFIER: &str = "gzip";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_gzip, create_codec_gzip)
}

fn is_name_gzip(name: &str) -> bool {
    name == IDENTIFIER
}

fn create_codec_gzip(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: GzipCodecConfiguration = metadata.to_configuration()?;
    Ok(Codec::BytesToBytes(Box::new(GzipCodec::new_with_configuration(
        &configuration,
    ))))
}

/// An invalid gzip compression level.
#[derive(Copy, Clone, Debug, Error)]
#[error("{0} is not a valid gzip compression level, expected 0 to 9")]
pub struct GzipCompressionLevelError(u32);

/// A gzip compression level, from 0 (no compression) to 9 (best compression).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GzipCompressionLevel(u32);

impl Default for GzipCompressionLevel {
    fn default() -> Self {
        Self(6)
    }
}

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = GzipCompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(GzipCompressionLevelError(level))
        }
    }
}

impl<'de> Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        Self::try_from(level).map_err(serde::de::Error::custom)
    }
}

/// The configuration of the `gzip` codec.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GzipCodecConfiguration {
    /// The compression level.
    pub level: GzipCompressionLevel,
}

/// The `gzip` bytes to bytes codec.
#[derive(Copy, Clone, Debug)]
pub struct GzipCodec {
    level: GzipCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`GzipCompressionLevelError`] if `level` is not in `0..=9`.
    pub fn new(level: u32) -> Result<Self, GzipCompressionLevelError> {
        Ok(Self {
            level: GzipCompressionLevel::try_from(level)?,
        })
    }

    /// Create a new `gzip` codec from a configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &GzipCodecConfiguration) -> Self {
        Self {
            level: configuration.level,
        }
    }
}

impl CodecTraits for GzipCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = GzipCodecConfiguration { level: self.level };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("gzip configuration is serializable")
    }
}

impl BytesToBytesCodecTraits for GzipCodec {
    fn encode(&self, bytes: Vec<u8>, _options: &CodecOptions) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.level.0));
        encoder.write_all(&bytes)?;
        Ok(encoder.finish()?)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;
        Ok(decoded)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation.size() {
            // deflate has a bounded expansion of 5 bytes per 16 KiB block, plus
            // the 10 byte gzip header and 8 byte trailer
            Some(size) => {
                BytesRepresentation::BoundedSize(size + size.div_ceil(16384) * 5 + 18)
            }
            None => BytesRepresentation::UnboundedSize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_codec_round_trip() {
        let codec = GzipCodec::new(5).unwrap();
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

    #[test]
    fn gzip_codec_level() {
        assert!(GzipCodec::new(0).is_ok());
        assert!(GzipCodec::new(9).is_ok());
        assert!(GzipCodec::new(10).is_err());
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level":10}"#).is_err());
    }

    #[test]
    fn gzip_codec_metadata() {
        let metadata = GzipCodec::new(1).unwrap().create_metadata();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"gzip","configuration":{"level":1}}"#
        );
        assert!(matches!(
            Codec::from_metadata(&metadata).unwrap(),
            Codec::BytesToBytes(_)
        ));
    }
}
