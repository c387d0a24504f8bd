//! Fill values.
//!
//! A [`FillValue`] holds the native-endian byte representation of one array
//! element, returned for logical positions whose chunk has never been
//! written. [`FillValueMetadata`] is its typed scalar form in the metadata
//! document.

use half::{bf16, f16};
use serde::{Deserialize, Serialize};

/// The scalar form of a fill value in the metadata document.
///
/// Non-finite floats are spelled as the strings `"NaN"`, `"Infinity"`, and
/// `"-Infinity"` since JSON numbers cannot represent them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FillValueMetadata {
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A float.
    Float(FillValueFloat),
    /// A string.
    String(String),
    /// Raw bytes.
    ByteArray(Vec<u8>),
}

/// A float fill value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FillValueFloat {
    /// A finite float.
    Float(f64),
    /// A non-finite float.
    NonFinite(FillValueFloatStringNonFinite),
}

impl FillValueFloat {
    /// The float as an `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Float(float) => *float,
            Self::NonFinite(nonfinite) => match nonfinite {
                FillValueFloatStringNonFinite::PosInfinity => f64::INFINITY,
                FillValueFloatStringNonFinite::NegInfinity => f64::NEG_INFINITY,
                FillValueFloatStringNonFinite::NaN => f64::NAN,
            },
        }
    }

    /// Create from an `f64`, using the non-finite spelling where needed.
    #[must_use]
    pub fn from_f64(float: f64) -> Self {
        if float.is_finite() {
            Self::Float(float)
        } else if float.is_nan() {
            Self::NonFinite(FillValueFloatStringNonFinite::NaN)
        } else if float > 0.0 {
            Self::NonFinite(FillValueFloatStringNonFinite::PosInfinity)
        } else {
            Self::NonFinite(FillValueFloatStringNonFinite::NegInfinity)
        }
    }
}

/// A non-finite float spelling.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum FillValueFloatStringNonFinite {
    /// Positive infinity.
    #[serde(rename = "Infinity")]
    PosInfinity,
    /// Negative infinity.
    #[serde(rename = "-Infinity")]
    NegInfinity,
    /// NaN.
    #[serde(rename = "NaN")]
    NaN,
}

/// The native-endian byte representation of one array element.
///
/// Empty for variable-length data types with an empty fill element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FillValue(Vec<u8>);

impl FillValue {
    /// Create a new fill value from `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The fill value bytes.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if `bytes` is entirely composed of repetitions of the fill value.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        if self.0.is_empty() {
            return bytes.is_empty();
        }
        bytes.len() % self.0.len() == 0
            && bytes
                .chunks_exact(self.0.len())
                .all(|element| element == self.0)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

macro_rules! from_ne_bytes {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

from_ne_bytes!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, f16, bf16);
