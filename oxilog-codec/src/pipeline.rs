//! End-to-end compression and decompression pipeline.
//!
//! The compressor streams input lines through a sliding window: each line
//! is delta-encoded against its most similar window line when one passes
//! the distance threshold and the aligner's cost survives the rejection
//! test, and stored verbatim otherwise. Records accumulate per block and
//! are appended to the output file at block boundaries, so memory stays
//! bounded by one block. After the last block the whole file is run
//! through the configured byte compressor in a second pass, header
//! included.
//!
//! Decompression reverses the pipeline exactly: the outer codec is
//! recognized by its magic bytes, the header restores the window size,
//! and every reconstructed line is pushed into a decoder-side window so
//! reference offsets resolve to the same lines the encoder saw.

use crate::block::{decode_records, encode_records};
use crate::distance::{DistanceKind, SimilarityMeasure};
use crate::ops::apply_ops;
use crate::qgram::qgram_ops;
use crate::record::Record;
use crate::substitution::substitution_ops;
use crate::window::SlidingWindow;
use oxilog_core::bitstream::{BitReader, BitWriter, WriteMode};
use oxilog_core::compressor::Compressor;
use oxilog_core::error::{OxiLogError, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Configuration of one compress invocation.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Bound of the sliding window; at least 1.
    pub window_size: u16,
    /// Distance cutoff in `[0, 1]` for accepting a reference.
    pub threshold: f64,
    /// Maximum records per block.
    pub block_size: usize,
    /// Byte compressor applied to the whole file as a second pass.
    pub compressor: Compressor,
    /// Similarity measure used to pick references.
    pub distance: DistanceKind,
    /// Use the approximate q-gram aligner instead of the exact one.
    pub use_approx: bool,
    /// Q-gram length.
    pub q: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            threshold: 0.06,
            block_size: 32_768,
            compressor: Compressor::Lzma,
            distance: DistanceKind::Minhash,
            use_approx: true,
            q: 3,
        }
    }
}

impl CodecConfig {
    fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(OxiLogError::invalid_argument("window size must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(OxiLogError::invalid_argument("block size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(OxiLogError::invalid_argument(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        if self.q == 0 {
            return Err(OxiLogError::invalid_argument("q-gram length must be at least 1"));
        }
        Ok(())
    }

    fn params_byte(&self) -> u32 {
        u32::from(self.compressor.id())
            | u32::from(self.distance.id()) << 4
            | u32::from(self.use_approx) << 7
    }
}

/// Split input into newline-separated records. A trailing newline does
/// not open a final empty record.
fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();
    if data.is_empty() || data.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

/// Compress `input` into `output`, returning the elapsed time.
pub fn compress(input: &Path, output: &Path, config: &CodecConfig) -> Result<Duration> {
    config.validate()?;
    let start = Instant::now();

    let data = fs::read(input)?;
    let lines = split_lines(&data);

    let mut writer = BitWriter::new();
    writer.encode(u32::from(config.window_size), 16);
    writer.encode(config.params_byte(), 8);
    writer.write(output, WriteMode::Truncate, Compressor::None)?;

    let mut window = SlidingWindow::new(usize::from(config.window_size));
    let mut measure = SimilarityMeasure::new(config.distance, config.q);
    let mut records: Vec<Record> = Vec::with_capacity(config.block_size.min(lines.len() + 1));
    let mut matched_lines = 0usize;
    let mut block_count = 0usize;

    for &line in &lines {
        let mut best: Option<usize> = None;
        let mut best_distance = 1.0;
        for (index, candidate) in window.iter().enumerate() {
            let distance = measure.distance(candidate, line);
            if distance < best_distance {
                best_distance = distance;
                best = Some(index);
            }
        }
        if best_distance >= config.threshold {
            best = None;
        }

        let record = match best.and_then(|index| window.get(index).map(|r| (index, r))) {
            None => Record::Literal { bytes: line.to_vec() },
            Some((index, reference)) => {
                let (ops, cost) = if config.use_approx {
                    qgram_ops(reference, line, config.q)
                } else {
                    substitution_ops(reference, line)
                };
                if cost > line.len() as f64 {
                    Record::Literal { bytes: line.to_vec() }
                } else {
                    matched_lines += 1;
                    Record::Matched {
                        reference: index as u32,
                        ops,
                    }
                }
            }
        };

        records.push(record);
        window.push(line.to_vec());

        if records.len() == config.block_size {
            encode_records(&records, &mut writer)?;
            writer.write(output, WriteMode::Append, Compressor::None)?;
            records.clear();
            measure.reset();
            block_count += 1;
        }
    }

    if !records.is_empty() {
        encode_records(&records, &mut writer)?;
        writer.write(output, WriteMode::Append, Compressor::None)?;
        block_count += 1;
    }

    log::debug!(
        "compressed {} lines ({} matched) into {} blocks",
        lines.len(),
        matched_lines,
        block_count
    );

    // Second pass: wrap the whole file, header included.
    if config.compressor != Compressor::None {
        let plain = fs::read(output)?;
        let wrapped = config.compressor.compress(&plain)?;
        fs::write(output, wrapped)?;
    }

    Ok(start.elapsed())
}

/// Decompress `input` into `output`, returning the elapsed time.
pub fn decompress(input: &Path, output: &Path) -> Result<Duration> {
    let start = Instant::now();

    let raw = fs::read(input)?;
    let outer = Compressor::detect(&raw);
    let mut reader = match outer {
        Compressor::None => BitReader::from_bytes(raw),
        other => BitReader::from_bytes(other.decompress(&raw)?),
    };

    let window_size = reader.decode_u16()? as usize;
    if window_size == 0 {
        return Err(OxiLogError::format("window size 0 in header"));
    }
    let params = reader.decode_u8()?;
    let compressor = Compressor::from_id(params & 0x0F)?;
    let distance = DistanceKind::from_id((params >> 4) & 0x07)?;
    let use_approx = params & 0x80 != 0;
    log::debug!(
        "header: window={window_size} compressor={compressor} distance={distance} approx={use_approx}"
    );

    let mut window = SlidingWindow::new(window_size);
    let mut out = BufWriter::new(fs::File::create(output)?);
    let mut line_count = 0usize;

    while let Some(records) = decode_records(&mut reader)? {
        for record in records {
            let line = match record {
                Record::Literal { bytes } => bytes,
                Record::Matched { reference, ops } => {
                    let reference = window.get(reference as usize).ok_or_else(|| {
                        OxiLogError::format(format!(
                            "reference offset {reference} outside window of {}",
                            window.len()
                        ))
                    })?;
                    apply_ops(&ops, reference)?
                }
            };
            out.write_all(&line)?;
            out.write_all(b"\n")?;
            window.push(line);
            line_count += 1;
        }
    }

    out.flush()?;
    log::debug!("decompressed {line_count} lines");

    Ok(start.elapsed())
}
