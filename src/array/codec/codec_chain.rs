//! The codec chain of a chunk: one array to bytes codec then zero or more
//! bytes to bytes codecs.

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::{BytesRepresentation, ChunkRepresentation};
use crate::metadata::Metadata;
use crate::plugin::PluginCreateError;

use super::{
    ArrayToBytesCodecTraits, BytesToBytesCodecTraits, Codec, CodecError, CodecOptions,
};

/// A chunk encoding pipeline.
///
/// `encode` runs the array to bytes codec then each bytes to bytes codec in
/// order; `decode` applies the inverses in reverse order. The chain satisfies
/// `decode(encode(x)) == x` for any chunk whose bytes are valid for its
/// representation.
#[derive(Clone, Debug)]
pub struct CodecChain {
    array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a codec chain from a list of codec metadata.
    ///
    /// The first entry must name an array to bytes codec and the remaining
    /// entries bytes to bytes codecs.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if any codec is unregistered or
    /// misconfigured, or if the list does not form a valid chain.
    pub fn from_metadata(metadatas: &[Metadata]) -> Result<Self, PluginCreateError> {
        let mut array_to_bytes: Option<Box<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>> = Vec::new();
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToBytes(codec) => {
                    if array_to_bytes.is_none() && bytes_to_bytes.is_empty() {
                        array_to_bytes = Some(codec);
                    } else {
                        return Err(PluginCreateError::from(format!(
                            "expected exactly one array to bytes codec at the start of the codec chain, found {}",
                            metadata.name()
                        )));
                    }
                }
                Codec::BytesToBytes(codec) => {
                    if array_to_bytes.is_none() {
                        return Err(PluginCreateError::from(format!(
                            "bytes to bytes codec {} precedes the array to bytes codec",
                            metadata.name()
                        )));
                    }
                    bytes_to_bytes.push(codec);
                }
            }
        }
        let array_to_bytes = array_to_bytes.ok_or_else(|| {
            PluginCreateError::from("the codec chain requires an array to bytes codec")
        })?;
        Ok(Self::new(array_to_bytes, bytes_to_bytes))
    }

    /// The codec metadata of the chain, in encode order.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<Metadata> {
        let mut metadatas = Vec::with_capacity(1 + self.bytes_to_bytes.len());
        metadatas.push(self.array_to_bytes.create_metadata());
        for codec in &self.bytes_to_bytes {
            metadatas.push(codec.create_metadata());
        }
        metadatas
    }

    /// The array to bytes codec.
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &dyn ArrayToBytesCodecTraits {
        self.array_to_bytes.as_ref()
    }

    /// Encode chunk `bytes` through the chain.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any stage fails.
    pub fn encode(
        &self,
        bytes: ArrayBytes,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut encoded = self
            .array_to_bytes
            .encode(bytes, decoded_representation, options)?;
        for codec in &self.bytes_to_bytes {
            encoded = codec.encode(encoded, options)?;
        }
        Ok(encoded)
    }

    /// Decode chunk `bytes` through the chain.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any stage fails, including checksum
    /// mismatches.
    pub fn decode(
        &self,
        mut bytes: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<ArrayBytes, CodecError> {
        let representations = self.bytes_representations(decoded_representation)?;
        for (codec, representation) in std::iter::zip(&self.bytes_to_bytes, &representations).rev()
        {
            bytes = codec.decode(bytes, representation, options)?;
        }
        self.array_to_bytes
            .decode(bytes, decoded_representation, options)
    }

    /// The size of the encoded chunk given the decoded representation.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the data type is unsupported.
    pub fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let mut representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            representation = codec.compute_encoded_size(&representation);
        }
        Ok(representation)
    }

    // The decoded representation seen by each bytes to bytes codec, in encode order.
    fn bytes_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut representations = Vec::with_capacity(self.bytes_to_bytes.len());
        let mut representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            representations.push(representation);
            representation = codec.compute_encoded_size(&representation);
        }
        Ok(representations)
    }
}
