//! The `crc32c` checksum codec.
//!
//! Appends a little-endian CRC32C checksum of the encoded bytes. Decoding
//! recomputes the checksum and fails with [`CodecError::InvalidChecksum`] on
//! a mismatch, unless validation is disabled in the [`CodecOptions`].

use crate::array::array_representation::BytesRepresentation;
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{BytesToBytesCodecTraits, Codec, CodecError, CodecOptions, CodecPlugin, CodecTraits};

/// The identifier of the `crc32c` codec.
pub const IDENTIFIER: &str = "crc32c";

/// The size of the checksum trailer in bytes.
pub const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, is_name_crc32c, create_codec_crc32c)
}

fn is_name_crc32c(name: &str) -> bool {
    name == IDENTIFIER
}

fn create_codec_crc32c(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    // the crc32c codec has no configuration parameters
    if metadata
        .configuration()
        .map_or(true, |configuration| configuration.is_empty())
    {
        Ok(Codec::BytesToBytes(Box::new(Crc32cCodec::new())))
    } else {
        Err(crate::metadata::ConfigurationInvalidError::new(
            IDENTIFIER.to_string(),
            metadata.configuration(),
        )
        .into())
    }
}

/// The `crc32c` checksum codec.
#[derive(Copy, Clone, Debug, Default)]
pub struct Crc32cCodec;

impl Crc32cCodec {
    /// Create a new `crc32c` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CodecTraits for Crc32cCodec {
    fn create_metadata(&self) -> Metadata {
        Metadata::new(IDENTIFIER)
    }
}

impl BytesToBytesCodecTraits for Crc32cCodec {
    fn encode(&self, mut bytes: Vec<u8>, _options: &CodecOptions) -> Result<Vec<u8>, CodecError> {
        let checksum = crc32c::crc32c(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
        Ok(bytes)
    }

    fn decode(
        &self,
        mut bytes: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        if bytes.len() < CHECKSUM_SIZE {
            return Err(CodecError::InvalidChecksum);
        }
        let split = bytes.len() - CHECKSUM_SIZE;
        if options.validate_checksums() {
            let stored = u32::from_le_bytes(bytes[split..].try_into().unwrap());
            if crc32c::crc32c(&bytes[..split]) != stored {
                return Err(CodecError::InvalidChecksum);
            }
        }
        bytes.truncate(split);
        Ok(bytes)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation.size() {
            Some(size) => BytesRepresentation::FixedSize(size + CHECKSUM_SIZE as u64),
            None => BytesRepresentation::UnboundedSize,
        }
    }
}
