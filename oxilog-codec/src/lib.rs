//! # OxiLog Codec
//!
//! Reference-based log compression.
//!
//! Consecutive log lines are highly redundant: most lines differ from a
//! recent neighbor by a timestamp, an identifier, or one field. This
//! crate exploits that by expressing each line as a reference to a line
//! in a sliding window plus a short list of substitution operations, and
//! serializing the resulting records column by column through a stack of
//! specialized numeric codecs:
//!
//! - [`pipeline`]: windowed matching, per-line method selection, block
//!   loop, header, final byte compression
//! - [`block`]: column-oriented record serialization
//! - [`distance`]: cosine, MinHash, and q-gram similarity measures
//! - [`qgram`]: approximate aligner over common q-gram anchors
//! - [`substitution`]: exact minimum-cost aligner
//! - [`ops`]: substitution operations and their replay
//! - [`rle`], [`packing`], [`ts2diff`]: the numeric column codecs
//! - [`window`], [`record`]: shared data model
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxilog_codec::pipeline::{compress, decompress, CodecConfig};
//! use std::path::Path;
//!
//! let config = CodecConfig::default();
//! compress(Path::new("app.log"), Path::new("app.oxl"), &config).unwrap();
//! decompress(Path::new("app.oxl"), Path::new("app.restored.log")).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod distance;
pub mod ops;
pub mod packing;
pub mod pipeline;
pub mod qgram;
pub mod record;
pub mod rle;
pub mod substitution;
pub mod ts2diff;
pub mod window;

// Re-exports for convenience
pub use distance::{DistanceKind, MinHasher, SimilarityMeasure};
pub use ops::{EditOp, apply_ops};
pub use pipeline::{CodecConfig, compress, decompress};
pub use record::Record;
pub use window::SlidingWindow;
