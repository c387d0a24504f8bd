//! Byte ranges.
//!
//! A [`ByteRange`] identifies a contiguous run of bytes within a value,
//! anchored at either the start or the end of the value. Ranges are resolved
//! against a concrete value size when they are applied.

use thiserror::Error;

/// An offset in bytes.
pub type ByteOffset = u64;

/// A length in bytes.
pub type ByteLength = u64;

/// A byte range relative to the start or end of a value.
///
/// An omitted length extends the range to the end of the value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ByteRange {
    /// A range anchored at the start of a value.
    FromStart(ByteOffset, Option<ByteLength>),
    /// A range anchored at the end of a value.
    FromEnd(ByteOffset, Option<ByteLength>),
}

impl ByteRange {
    /// Return the inclusive start of the range resolved against a value of `size` bytes.
    #[must_use]
    pub fn start(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, _) => *offset,
            Self::FromEnd(offset, length) => length.map_or(0, |length| size - *offset - length),
        }
    }

    /// Return the exclusive end of the range resolved against a value of `size` bytes.
    #[must_use]
    pub fn end(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, length) => length.map_or(size, |length| offset + length),
            Self::FromEnd(offset, _) => size - offset,
        }
    }

    /// Return the length of the range resolved against a value of `size` bytes.
    #[must_use]
    pub fn length(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, None) => size - offset,
            Self::FromEnd(_, None) => self.end(size),
            Self::FromStart(_, Some(length)) | Self::FromEnd(_, Some(length)) => *length,
        }
    }

    /// Return true if the range fits within a value of `size` bytes.
    #[must_use]
    pub fn fits(&self, size: u64) -> bool {
        let (offset, length) = match self {
            Self::FromStart(offset, length) | Self::FromEnd(offset, length) => {
                (*offset, length.unwrap_or(0))
            }
        };
        offset + length <= size
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromStart(offset, length) => write!(
                f,
                "{}..{}",
                offset,
                length.map_or(String::new(), |length| (offset + length).to_string())
            ),
            Self::FromEnd(offset, length) => write!(
                f,
                "{}..-{offset}",
                length.map_or(String::new(), |length| format!("-{}", offset + length))
            ),
        }
    }
}

/// A byte range that does not fit within the value it was applied to.
#[derive(Copy, Clone, Debug, Error)]
#[error("byte range {0} is invalid for a value of {1} bytes")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, size: u64) -> Self {
        Self(byte_range, size)
    }
}

fn validate_byte_ranges(byte_ranges: &[ByteRange], size: u64) -> Result<(), InvalidByteRangeError> {
    for byte_range in byte_ranges {
        if !byte_range.fits(size) {
            return Err(InvalidByteRangeError(*byte_range, size));
        }
    }
    Ok(())
}

/// Extract byte ranges from `bytes`.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any range does not fit within `bytes`.
pub fn extract_byte_ranges(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<Vec<u8>>, InvalidByteRangeError> {
    validate_byte_ranges(byte_ranges, bytes.len() as u64)?;
    Ok(unsafe { extract_byte_ranges_unchecked(bytes, byte_ranges) })
}

/// Extract byte ranges from `bytes` without validation.
///
/// # Safety
/// All byte ranges in `byte_ranges` must fit within `bytes`.
#[must_use]
pub unsafe fn extract_byte_ranges_unchecked(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Vec<Vec<u8>> {
    let size = bytes.len() as u64;
    byte_ranges
        .iter()
        .map(|byte_range| {
            let start = usize::try_from(byte_range.start(size)).unwrap();
            let end = usize::try_from(byte_range.end(size)).unwrap();
            debug_assert!(end <= bytes.len());
            bytes[start..end].to_vec()
        })
        .collect()
}

/// Extract byte ranges from `bytes` concatenated into a single buffer.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any range does not fit within `bytes`.
pub fn extract_byte_ranges_concat(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<u8>, InvalidByteRangeError> {
    validate_byte_ranges(byte_ranges, bytes.len() as u64)?;
    Ok(unsafe { extract_byte_ranges_concat_unchecked(bytes, byte_ranges) })
}

/// Extract byte ranges from `bytes` concatenated into a single buffer, without validation.
///
/// # Safety
/// All byte ranges in `byte_ranges` must fit within `bytes`.
#[must_use]
pub unsafe fn extract_byte_ranges_concat_unchecked(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Vec<u8> {
    let size = bytes.len() as u64;
    let length = byte_ranges
        .iter()
        .map(|byte_range| usize::try_from(byte_range.length(size)).unwrap())
        .sum();
    let mut out = Vec::with_capacity(length);
    for byte_range in byte_ranges {
        let start = usize::try_from(byte_range.start(size)).unwrap();
        let end = usize::try_from(byte_range.end(size)).unwrap();
        out.extend_from_slice(&bytes[start..end]);
    }
    out
}
