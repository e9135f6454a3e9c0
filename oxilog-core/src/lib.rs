//! # OxiLog Core
//!
//! Core components for the OxiLog log compression library.
//!
//! This crate provides the building blocks shared by the codec layers:
//!
//! - [`bitstream`]: MSB-first bit-level I/O over byte buffers
//! - [`compressor`]: pluggable byte-level block compressors
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! OxiLog is designed as a layered stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Pipeline                                            │
//! │     windowed matching, block loop, CLI                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Record codec                                        │
//! │     column layout, RLE, bit packing, TS-2DIFF           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitWriter/BitReader, block compressors              │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod compressor;
pub mod error;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter, WriteMode};
pub use compressor::Compressor;
pub use error::{OxiLogError, Result};
