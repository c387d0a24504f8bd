//! Codecs, the encoding pipeline stages of a chunk.
//!
//! A chunk is encoded by exactly one array to bytes codec followed by any
//! number of bytes to bytes codecs; decoding applies the inverses in reverse
//! order. Codecs are self-registering via [`CodecPlugin`] and are created
//! from their [`Metadata`], so an array opens only with codecs the build
//! understands.

pub mod codec_chain;
pub mod endian;
pub mod options;
pub mod vlen;

#[cfg(feature = "crc32c")]
pub mod crc32c;
#[cfg(feature = "gzip")]
pub mod gzip;
#[cfg(feature = "zstd")]
pub mod zstd;

pub use codec_chain::CodecChain;
pub use options::CodecOptions;

use dyn_clone::DynClone;
use thiserror::Error;

use crate::array_subset::IncompatibleArraySubsetAndShapeError;
use crate::byte_range::InvalidByteRangeError;
use crate::metadata::Metadata;
use crate::plugin::{Plugin, PluginCreateError};

use super::array_bytes::ArrayBytes;
use super::array_representation::{BytesRepresentation, ChunkRepresentation};
use super::data_type::DataType;

/// A codec plugin.
pub type CodecPlugin = Plugin<Codec>;
inventory::collect!(CodecPlugin);

/// A generic codec.
#[derive(Clone, Debug)]
pub enum Codec {
    /// An array to bytes codec.
    ArrayToBytes(Box<dyn ArrayToBytesCodecTraits>),
    /// A bytes to bytes codec.
    BytesToBytes(Box<dyn BytesToBytesCodecTraits>),
}

impl Codec {
    /// Create a codec from `metadata`.
    ///
    /// # Errors
    /// Returns [`PluginCreateError::Unsupported`] if the codec is not
    /// registered, or a [`PluginCreateError`] if the configuration is invalid.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, PluginCreateError> {
        for plugin in inventory::iter::<CodecPlugin> {
            if plugin.match_name(metadata.name()) {
                return plugin.create(metadata);
            }
        }
        Err(PluginCreateError::Unsupported {
            name: metadata.name().to_string(),
            plugin_type: "codec".to_string(),
        })
    }
}

/// Traits common to all codecs.
pub trait CodecTraits: Send + Sync {
    /// The metadata of this codec, including its configuration.
    fn create_metadata(&self) -> Metadata;
}

/// Traits for a codec converting between array elements and a flat byte stream.
pub trait ArrayToBytesCodecTraits: CodecTraits + DynClone + core::fmt::Debug {
    /// Encode the elements of a chunk.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `bytes` is incompatible with
    /// `decoded_representation` or encoding fails.
    fn encode(
        &self,
        bytes: ArrayBytes,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode the elements of a chunk.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `bytes` cannot be decoded into
    /// `decoded_representation`.
    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, CodecError>;

    /// The size of the encoded bytes given the decoded representation.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the data type is unsupported.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToBytesCodecTraits);

/// Traits for a codec transforming a byte stream.
pub trait BytesToBytesCodecTraits: CodecTraits + DynClone + core::fmt::Debug {
    /// Encode `bytes`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    fn encode(&self, bytes: Vec<u8>, options: &CodecOptions) -> Result<Vec<u8>, CodecError>;

    /// Decode `bytes`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `bytes` is corrupt or decoding fails.
    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// The size of the encoded bytes given the decoded representation.
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation;
}

dyn_clone::clone_trait_object!(BytesToBytesCodecTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid byte range was requested.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// An array subset is incompatible with an array shape.
    #[error(transparent)]
    IncompatibleArraySubsetAndShape(#[from] IncompatibleArraySubsetAndShapeError),
    /// The decoded size of a chunk did not match the expected size.
    #[error("the decoded chunk has {0} bytes, expected {1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// A stored checksum does not match the checksum of the decoded bytes.
    #[error("checksum validation failed")]
    InvalidChecksum,
    /// Expected fixed-width array bytes.
    #[error("expected fixed length array bytes")]
    ExpectedFixedLengthBytes,
    /// Expected variable-length array bytes.
    #[error("expected variable length array bytes")]
    ExpectedVariableLengthBytes,
    /// The offsets of variable-length array bytes are invalid.
    #[error("variable-sized array offsets are out of order or out of bounds")]
    InvalidVariableSizedArrayOffsets,
    /// The data type is not supported by a codec.
    #[error("data type {0} is not supported by the {1} codec")]
    UnsupportedDataType(DataType, String),
    /// Any other codec error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
