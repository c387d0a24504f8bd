//! Options for codec encoding and decoding.

/// Options passed explicitly through every encode and decode call.
#[derive(Copy, Clone, Debug)]
pub struct CodecOptions {
    validate_checksums: bool,
    concurrent_target: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            validate_checksums: true,
            concurrent_target: rayon::current_num_threads(),
        }
    }
}

impl CodecOptions {
    /// Create codec options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if checksum codecs validate on decode.
    #[must_use]
    pub const fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set whether checksum codecs validate on decode.
    #[must_use]
    pub const fn with_validate_checksums(mut self, validate_checksums: bool) -> Self {
        self.validate_checksums = validate_checksums;
        self
    }

    /// The target concurrency for operations spanning multiple chunks.
    #[must_use]
    pub const fn concurrent_target(&self) -> usize {
        self.concurrent_target
    }

    /// Set the target concurrency for operations spanning multiple chunks.
    #[must_use]
    pub const fn with_concurrent_target(mut self, concurrent_target: usize) -> Self {
        self.concurrent_target = concurrent_target;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_options_builders() {
        let options = CodecOptions::new()
            .with_validate_checksums(false)
            .with_concurrent_target(2);
        assert!(!options.validate_checksums());
        assert_eq!(options.concurrent_target(), 2);
        assert!(CodecOptions::default().validate_checksums());
    }
}
