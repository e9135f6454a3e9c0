//! Delta-of-delta integer codec (TS-2DIFF).
//!
//! Signed integers are grouped into logical blocks of 64 values. Each
//! block stores its first value, the minimum of the consecutive deltas,
//! and the deltas rebased against that minimum at a fixed bit width. The
//! writer byte-aligns after every block and the reader discards the same
//! padding, so surrounding columns always start on a byte boundary.
//!
//! Delta arithmetic wraps in 32 bits, which keeps the residuals inside
//! `u32` for every possible `i32` input.

use oxilog_core::bitstream::{BitReader, BitWriter};
use oxilog_core::error::{OxiLogError, Result};

/// Number of values per logical block.
const BLOCK_SIZE: usize = 64;

fn encode_block(writer: &mut BitWriter, data: &[i32]) {
    writer.encode(data[0] as u32, 32);

    if data.len() == 1 {
        writer.encode(0, 32);
        writer.encode(0, 12);
        writer.pack();
        return;
    }

    let deltas: Vec<i32> = data.windows(2).map(|p| p[1].wrapping_sub(p[0])).collect();
    let min_delta = deltas.iter().copied().min().unwrap_or(0);
    let max_delta = deltas.iter().copied().max().unwrap_or(0);
    let range = (i64::from(max_delta) - i64::from(min_delta)) as u64;

    let mut bit_width = 1u8;
    while bit_width < 32 && (1u64 << bit_width) <= range {
        bit_width += 1;
    }

    writer.encode(min_delta as u32, 32);
    writer.encode(deltas.len() as u32, 12);
    writer.encode(u32::from(bit_width), 8);
    for &delta in &deltas {
        let rebased = (i64::from(delta) - i64::from(min_delta)) as u32;
        writer.encode(rebased, bit_width);
    }
    writer.pack();
}

/// Encode `data` into `writer` as a block count followed by the blocks.
pub fn ts2diff_encode(data: &[i32], writer: &mut BitWriter) {
    let block_count = data.len().div_ceil(BLOCK_SIZE);
    writer.encode(block_count as u32, 32);
    for chunk in data.chunks(BLOCK_SIZE) {
        encode_block(writer, chunk);
    }
}

fn decode_block(reader: &mut BitReader) -> Result<Vec<i32>> {
    let first_value = reader.decode_u32()? as i32;
    let min_delta = reader.decode_u32()? as i32;
    let delta_count = reader.decode(12)? as usize;

    if delta_count == 0 {
        reader.align();
        return Ok(vec![first_value]);
    }
    if delta_count >= BLOCK_SIZE {
        return Err(OxiLogError::format(format!(
            "delta count {delta_count} exceeds block size"
        )));
    }

    let bit_width = reader.decode_u8()?;
    if bit_width == 0 || bit_width > 32 {
        return Err(OxiLogError::format(format!(
            "ts2diff bit width out of range: {bit_width}"
        )));
    }

    let mut values = Vec::with_capacity(delta_count + 1);
    let mut acc = first_value;
    values.push(acc);
    for _ in 0..delta_count {
        let rebased = reader.decode(bit_width)?;
        let delta = (i64::from(rebased) + i64::from(min_delta)) as i32;
        acc = acc.wrapping_add(delta);
        values.push(acc);
    }
    reader.align();

    Ok(values)
}

/// Decode a full TS-2DIFF stream written by [`ts2diff_encode`].
pub fn ts2diff_decode(reader: &mut BitReader) -> Result<Vec<i32>> {
    let block_count = reader.decode_u32()? as usize;
    let mut values = Vec::new();
    for _ in 0..block_count {
        values.extend(decode_block(reader)?);
    }
    Ok(values)
}
