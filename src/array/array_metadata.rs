//! The array metadata document.
//!
//! The `array.json` document under an array's path holds everything needed
//! to interpret its chunks: the format version, shape, data type, chunk
//! shape, fill value, and codec chain. Unknown optional fields are preserved
//! across rewrite; an unknown field marked `"must_understand": true` fails
//! parsing.

use std::num::NonZeroU64;

use monostate::MustBe;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metadata::{validate_additional_fields, AdditionalFields, Metadata};

use super::chunk_key_encoding::ChunkKeySeparator;
use super::fill_value::FillValueMetadata;

/// The metadata document of an array.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArrayMetadata {
    /// The format version, pinned to `1`.
    pub format_version: MustBe!(1u64),
    /// The array shape.
    pub shape: Vec<u64>,
    /// The data type identifier.
    pub data_type: String,
    /// The chunk shape, non-zero in every dimension.
    pub chunk_shape: Vec<NonZeroU64>,
    /// The chunk key separator.
    #[serde(default)]
    pub chunk_key_separator: ChunkKeySeparator,
    /// The fill value.
    pub fill_value: FillValueMetadata,
    /// The codec chain, in encode order.
    pub codecs: Vec<Metadata>,
    /// Arbitrary user attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Unknown fields, preserved across rewrite.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

/// An array metadata error.
#[derive(Debug, Error)]
pub enum ArrayMetadataError {
    /// The format version is not supported.
    #[error("array metadata format version {0} is not supported")]
    UnsupportedVersion(u64),
    /// The metadata document does not match the schema.
    #[error("array metadata is invalid: {0}")]
    InvalidMetadata(String),
    /// The metadata contains an unknown field marked as required.
    #[error("array metadata field {0} is required but not understood")]
    UnknownRequiredField(String),
}

impl ArrayMetadata {
    /// Create array metadata.
    #[must_use]
    pub fn new(
        shape: Vec<u64>,
        data_type: String,
        chunk_shape: Vec<NonZeroU64>,
        fill_value: FillValueMetadata,
        codecs: Vec<Metadata>,
    ) -> Self {
        Self {
            format_version: MustBe!(1u64),
            shape,
            data_type,
            chunk_shape,
            chunk_key_separator: ChunkKeySeparator::default(),
            fill_value,
            codecs,
            attributes: serde_json::Map::new(),
            additional_fields: AdditionalFields::new(),
        }
    }

    /// Set the user attributes.
    #[must_use]
    pub fn with_attributes(
        mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the chunk key separator.
    #[must_use]
    pub fn with_chunk_key_separator(mut self, chunk_key_separator: ChunkKeySeparator) -> Self {
        self.chunk_key_separator = chunk_key_separator;
        self
    }

    /// Parse an array metadata document.
    ///
    /// The version is checked before the rest of the schema, so a document
    /// from a newer format fails with
    /// [`ArrayMetadataError::UnsupportedVersion`] rather than a generic
    /// schema error.
    ///
    /// # Errors
    /// Returns an [`ArrayMetadataError`] if the document is not valid.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArrayMetadataError> {
        #[derive(Deserialize)]
        struct VersionProbe {
            format_version: u64,
        }

        let probe: VersionProbe = serde_json::from_slice(bytes)
            .map_err(|err| ArrayMetadataError::InvalidMetadata(err.to_string()))?;
        if probe.format_version != 1 {
            return Err(ArrayMetadataError::UnsupportedVersion(probe.format_version));
        }

        let metadata: Self = serde_json::from_slice(bytes)
            .map_err(|err| ArrayMetadataError::InvalidMetadata(err.to_string()))?;
        validate_additional_fields(&metadata.additional_fields)
            .map_err(ArrayMetadataError::UnknownRequiredField)?;
        Ok(metadata)
    }

    /// Serialize to a pretty-printed JSON document.
    ///
    /// # Panics
    /// Panics if JSON serialization fails, which cannot happen for a valid
    /// metadata document.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).expect("array metadata is serializable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID: &str = r#"{
        "format_version": 1,
        "shape": [100, 100],
        "data_type": "float32",
        "chunk_shape": [50, 50],
        "chunk_key_separator": "/",
        "fill_value": 0.0,
        "codecs": [{"name": "endian", "configuration": {"endian": "little"}}]
    }"#;

    #[test]
    fn array_metadata_parse() {
        let metadata = ArrayMetadata::from_slice(JSON_VALID.as_bytes()).unwrap();
        assert_eq!(metadata.shape, vec![100, 100]);
        assert_eq!(metadata.data_type, "float32");
        assert_eq!(
            metadata.chunk_shape,
            vec![NonZeroU64::new(50).unwrap(), NonZeroU64::new(50).unwrap()]
        );
        assert_eq!(metadata.codecs.len(), 1);
    }

    #[test]
    fn array_metadata_round_trip() {
        let metadata = ArrayMetadata::from_slice(JSON_VALID.as_bytes()).unwrap();
        let bytes = metadata.to_vec();
        assert_eq!(ArrayMetadata::from_slice(&bytes).unwrap(), metadata);
    }

    #[test]
    fn array_metadata_unsupported_version() {
        let json = JSON_VALID.replace(r#""format_version": 1"#, r#""format_version": 2"#);
        assert!(matches!(
            ArrayMetadata::from_slice(json.as_bytes()),
            Err(ArrayMetadataError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn array_metadata_invalid() {
        assert!(matches!(
            ArrayMetadata::from_slice(b"not json"),
            Err(ArrayMetadataError::InvalidMetadata(_))
        ));
        // missing fill_value
        let json = JSON_VALID.replace(r#""fill_value": 0.0,"#, "");
        assert!(matches!(
            ArrayMetadata::from_slice(json.as_bytes()),
            Err(ArrayMetadataError::InvalidMetadata(_))
        ));
        // zero chunk extent
        let json = JSON_VALID.replace("[50, 50]", "[50, 0]");
        assert!(matches!(
            ArrayMetadata::from_slice(json.as_bytes()),
            Err(ArrayMetadataError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn array_metadata_unknown_fields() {
        // optional unknown fields are preserved
        let json = JSON_VALID.replace(
            r#""format_version": 1,"#,
            r#""format_version": 1, "new_feature": {"x": 1},"#,
        );
        let metadata = ArrayMetadata::from_slice(json.as_bytes()).unwrap();
        assert!(metadata.additional_fields.contains_key("new_feature"));
        let rewritten = ArrayMetadata::from_slice(&metadata.to_vec()).unwrap();
        assert!(rewritten.additional_fields.contains_key("new_feature"));

        // required unknown fields fail
        let json = JSON_VALID.replace(
            r#""format_version": 1,"#,
            r#""format_version": 1, "new_feature": {"must_understand": true},"#,
        );
        assert!(matches!(
            ArrayMetadata::from_slice(json.as_bytes()),
            Err(ArrayMetadataError::UnknownRequiredField(field)) if field == "new_feature"
        ));
    }
}
