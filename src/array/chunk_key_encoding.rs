//! Chunk key encoding.
//!
//! A chunk key is the string `c` followed by the chunk grid indices, all
//! joined by the configured separator. A zero-dimensional array has the key
//! `c` alone.

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use itertools::Itertools;

/// The separator between the `c` prefix and grid indices of a chunk key.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq)]
pub enum ChunkKeySeparator {
    /// The `/` separator.
    #[default]
    #[display("/")]
    Slash,
    /// The `.` separator.
    #[display(".")]
    Dot,
}

impl TryFrom<char> for ChunkKeySeparator {
    type Error = char;

    fn try_from(separator: char) -> Result<Self, Self::Error> {
        match separator {
            '/' => Ok(Self::Slash),
            '.' => Ok(Self::Dot),
            _ => Err(separator),
        }
    }
}

impl Serialize for ChunkKeySeparator {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Slash => s.serialize_char('/'),
            Self::Dot => s.serialize_char('.'),
        }
    }
}

impl<'de> Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let separator = String::deserialize(d)?;
        match separator.as_str() {
            "/" => Ok(Self::Slash),
            "." => Ok(Self::Dot),
            _ => Err(serde::de::Error::custom(format!(
                "chunk key separator must be / or ., got {separator}"
            ))),
        }
    }
}

/// The encoding of chunk grid indices into chunk keys.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl ChunkKeyEncoding {
    /// Create a new chunk key encoding with `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// The separator.
    #[must_use]
    pub const fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    /// Encode `chunk_indices` into a chunk key, relative to the array path.
    #[must_use]
    pub fn encode(&self, chunk_indices: &[u64]) -> String {
        if chunk_indices.is_empty() {
            "c".to_string()
        } else {
            format!(
                "c{}{}",
                self.separator,
                chunk_indices.iter().join(&self.separator.to_string())
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_slash() {
        let encoding = ChunkKeyEncoding::new(ChunkKeySeparator::Slash);
        assert_eq!(encoding.encode(&[2, 0, 1]), "c/2/0/1");
        assert_eq!(encoding.encode(&[]), "c");
    }

    #[test]
    fn chunk_key_dot() {
        let encoding = ChunkKeyEncoding::new(ChunkKeySeparator::Dot);
        assert_eq!(encoding.encode(&[2, 0, 1]), "c.2.0.1");
    }

    #[test]
    fn chunk_key_separator_json() {
        assert_eq!(
            serde_json::from_str::<ChunkKeySeparator>(r#""/""#).unwrap(),
            ChunkKeySeparator::Slash
        );
        assert_eq!(
            serde_json::from_str::<ChunkKeySeparator>(r#"".""#).unwrap(),
            ChunkKeySeparator::Dot
        );
        assert!(serde_json::from_str::<ChunkKeySeparator>(r#""-""#).is_err());
        assert_eq!(
            serde_json::to_string(&ChunkKeySeparator::Dot).unwrap(),
            r#"".""#
        );
    }
}
