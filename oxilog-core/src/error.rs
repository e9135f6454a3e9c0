//! Error types for OxiLog operations.
//!
//! This module provides one error type covering every failure mode of the
//! codec: I/O failures, block compressor failures, bit-stream underflow,
//! structural format errors, and API misuse.

use std::io;
use thiserror::Error;

/// The main error type for OxiLog operations.
#[derive(Debug, Error)]
pub enum OxiLogError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A block compressor or decompressor reported failure.
    #[error("{codec} codec error: {message}")]
    Codec {
        /// Name of the failing codec.
        codec: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// Bit stream read past the end of the buffer.
    #[error("bit stream underflow: needed {needed} more bits")]
    Underflow {
        /// Number of bits that were requested but not available.
        needed: usize,
    },

    /// Impossible field value in the compressed stream.
    #[error("format error: {message}")]
    Format {
        /// Description of the structural error.
        message: String,
    },

    /// API-level misuse.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the misuse.
        message: String,
    },
}

/// Result type alias for OxiLog operations.
pub type Result<T> = std::result::Result<T, OxiLogError>;

impl OxiLogError {
    /// Create a codec error.
    pub fn codec(codec: &'static str, message: impl ToString) -> Self {
        Self::Codec {
            codec,
            message: message.to_string(),
        }
    }

    /// Create an underflow error.
    pub fn underflow(needed: usize) -> Self {
        Self::Underflow { needed }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// True when this error is a bit-stream underflow.
    ///
    /// The pipeline driver uses this to probe for the end of the block
    /// sequence without treating it as fatal.
    pub fn is_underflow(&self) -> bool {
        matches!(self, Self::Underflow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiLogError::codec("zstd", "bad frame");
        assert!(err.to_string().contains("zstd"));

        let err = OxiLogError::underflow(12);
        assert!(err.to_string().contains("12"));

        let err = OxiLogError::format("bit width 0");
        assert!(err.to_string().contains("bit width 0"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiLogError = io_err.into();
        assert!(matches!(err, OxiLogError::Io(_)));
    }

    #[test]
    fn test_is_underflow() {
        assert!(OxiLogError::underflow(1).is_underflow());
        assert!(!OxiLogError::format("x").is_underflow());
    }
}
