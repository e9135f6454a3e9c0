//! Byte-level block compressors.
//!
//! The record codec produces a byte stream that is optionally wrapped in a
//! general-purpose compressor as a whole-file second pass. This module
//! puts the supported codecs behind one enum with round-trip
//! `compress`/`decompress` on whole buffers, plus magic-number detection
//! for the decompression side.
//!
//! The identifiers are part of the file format: they are stored in the
//! four low bits of the header params byte and must never be renumbered.
//!
//! # Example
//!
//! ```
//! use oxilog_core::compressor::Compressor;
//!
//! let data = b"Jun  9 06:06:51 combo anacron: anacron startup succeeded\n";
//! let compressed = Compressor::Zstd.compress(data).unwrap();
//! let restored = Compressor::Zstd.decompress(&compressed).unwrap();
//! assert_eq!(restored, data);
//! ```

use crate::error::{OxiLogError, Result};
use std::io::{Read, Write};

/// Supported byte-level block compressors.
///
/// `None` is the identity codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compressor {
    /// No byte-level compression.
    #[default]
    None,
    /// XZ container around LZMA2.
    Lzma,
    /// GZIP (DEFLATE).
    Gzip,
    /// Zstandard.
    Zstd,
    /// LZ4 frame format.
    Lz4,
    /// Bzip2.
    Bzip2,
}

impl Compressor {
    /// Stable wire identifier, stored in the file header.
    pub fn id(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lzma => 1,
            Self::Gzip => 2,
            Self::Zstd => 3,
            Self::Lz4 => 4,
            Self::Bzip2 => 5,
        }
    }

    /// Inverse of [`Compressor::id`]; fails on unknown identifiers.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Lzma),
            2 => Ok(Self::Gzip),
            3 => Ok(Self::Zstd),
            4 => Ok(Self::Lz4),
            5 => Ok(Self::Bzip2),
            other => Err(OxiLogError::format(format!(
                "unknown compressor id {other}"
            ))),
        }
    }

    /// Compressor name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzma => "lzma",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
            Self::Lz4 => "lz4",
            Self::Bzip2 => "bzip2",
        }
    }

    /// Detect the codec wrapping `data` from its magic bytes.
    ///
    /// Anything without a recognized signature is treated as an
    /// uncompressed stream.
    pub fn detect(data: &[u8]) -> Self {
        // XZ: FD 37 7A 58 5A 00
        if data.len() >= 6 && data.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]) {
            return Self::Lzma;
        }

        // GZIP: 1F 8B
        if data.starts_with(&[0x1F, 0x8B]) {
            return Self::Gzip;
        }

        // Zstandard: 28 B5 2F FD
        if data.len() >= 4 && data.starts_with(&[0x28, 0xB5, 0x2F, 0xFD]) {
            return Self::Zstd;
        }

        // LZ4 frame: 04 22 4D 18
        if data.len() >= 4 && data.starts_with(&[0x04, 0x22, 0x4D, 0x18]) {
            return Self::Lz4;
        }

        // Bzip2: "BZh"
        if data.len() >= 3 && data.starts_with(b"BZh") {
            return Self::Bzip2;
        }

        Self::None
    }

    /// Compress a whole buffer.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lzma => {
                let mut encoder = liblzma::read::XzEncoder::new(data, 6);
                let mut out = Vec::new();
                encoder
                    .read_to_end(&mut out)
                    .map_err(|e| OxiLogError::codec("lzma", e))?;
                Ok(out)
            }
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
                encoder
                    .write_all(data)
                    .map_err(|e| OxiLogError::codec("gzip", e))?;
                encoder.finish().map_err(|e| OxiLogError::codec("gzip", e))
            }
            Self::Zstd => {
                zstd::stream::encode_all(data, 19).map_err(|e| OxiLogError::codec("zstd", e))
            }
            Self::Lz4 => {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
                encoder
                    .write_all(data)
                    .map_err(|e| OxiLogError::codec("lz4", e))?;
                encoder.finish().map_err(|e| OxiLogError::codec("lz4", e))
            }
            Self::Bzip2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
                encoder
                    .write_all(data)
                    .map_err(|e| OxiLogError::codec("bzip2", e))?;
                encoder.finish().map_err(|e| OxiLogError::codec("bzip2", e))
            }
        }
    }

    /// Decompress a whole buffer.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Lzma => {
                let mut decoder = liblzma::read::XzDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| OxiLogError::codec("lzma", e))?;
                Ok(out)
            }
            Self::Gzip => {
                let mut decoder = flate2::read::GzDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| OxiLogError::codec("gzip", e))?;
                Ok(out)
            }
            Self::Zstd => {
                zstd::stream::decode_all(data).map_err(|e| OxiLogError::codec("zstd", e))
            }
            Self::Lz4 => {
                let mut decoder = lz4_flex::frame::FrameDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| OxiLogError::codec("lz4", e))?;
                Ok(out)
            }
            Self::Bzip2 => {
                let mut decoder = bzip2::read::BzDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| OxiLogError::codec("bzip2", e))?;
                Ok(out)
            }
        }
    }
}

impl std::fmt::Display for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
