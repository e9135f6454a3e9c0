//! Column-oriented block codec for records.
//!
//! A block of records is serialized column by column, each column with
//! its own codec, in a fixed order. Every count a column needs appears in
//! the stream before that column, so the decoder never looks ahead:
//!
//! 1. matched and literal record counts (32 bits each);
//! 2. the method column, run-length encoded, framed by a 16-bit byte
//!    length and followed by its 32-bit interval count;
//! 3. the reference and op-count columns, bit-packed, each framed by a
//!    16-bit byte length, present only when there are matched records;
//! 4. the length column (per record: deletion lengths then insertion
//!    lengths), TS-2DIFF encoded, always framed;
//! 5. the position columns (`p_begin` with each record's first position,
//!    `p_delta` with the in-record deltas), TS-2DIFF encoded, present
//!    only when there are matched records;
//! 6. the payload: every matched record's replacement bytes in record
//!    and op order, then every literal line terminated by `0x0A`.
//!
//! A `(0, 0)` count pair never occurs for a real block; the decoder
//! treats it, or a clean underflow while probing the first count, as the
//! end of the block sequence.

use crate::ops::EditOp;
use crate::packing::{bit_packing_decode, bit_packing_encode};
use crate::record::Record;
use crate::rle::{rle_decode, rle_encode};
use crate::ts2diff::{ts2diff_decode, ts2diff_encode};
use oxilog_core::bitstream::{BitReader, BitWriter};
use oxilog_core::error::{OxiLogError, Result};

/// Columns framed by a 16-bit byte length cannot exceed this size.
const COLUMN_LIMIT: usize = u16::MAX as usize;

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| OxiLogError::format(format!("{what} {value} does not fit in 32 bits")))
}

fn to_usize(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| OxiLogError::format(format!("negative {what}: {value}")))
}

fn encode_framed(writer: &mut BitWriter, name: &str, bytes: &[u8]) -> Result<()> {
    if bytes.len() > COLUMN_LIMIT {
        return Err(OxiLogError::format(format!(
            "{name} column of {} bytes overflows its 16-bit frame",
            bytes.len()
        )));
    }
    writer.encode(bytes.len() as u32, 16);
    writer.encode_bytes(bytes);
    Ok(())
}

/// Serialize a block of records into `writer`.
pub fn encode_records(records: &[Record], writer: &mut BitWriter) -> Result<()> {
    let mut method_bits = Vec::with_capacity(records.len());
    let mut references = Vec::new();
    let mut op_counts = Vec::new();
    let mut lengths: Vec<i32> = Vec::new();
    let mut p_begin: Vec<i32> = Vec::new();
    let mut p_delta: Vec<i32> = Vec::new();

    for record in records {
        method_bits.push(record.is_literal());
        if let Record::Matched { reference, ops } = record {
            references.push(*reference);
            op_counts.push(to_i32(ops.len(), "operation count")? as u32);
            for op in ops {
                lengths.push(to_i32(op.del_len, "deletion length")?);
            }
            for op in ops {
                lengths.push(to_i32(op.text.len(), "insertion length")?);
            }
            let mut prev: Option<i32> = None;
            for op in ops {
                let position = to_i32(op.position, "operation position")?;
                match prev {
                    None => p_begin.push(position),
                    Some(p) => p_delta.push(position - p),
                }
                prev = Some(position);
            }
        }
    }

    let records0 = references.len();
    let records1 = records.len() - records0;
    writer.encode(records0 as u32, 32);
    writer.encode(records1 as u32, 32);

    let (method_bytes, interval_count) = rle_encode(&method_bits);
    encode_framed(writer, "method", &method_bytes)?;
    writer.encode(interval_count as u32, 32);

    if records0 > 0 {
        encode_framed(writer, "reference", &bit_packing_encode(&references))?;
        encode_framed(writer, "op-count", &bit_packing_encode(&op_counts))?;
    }

    ts2diff_encode(&lengths, writer);

    if records0 > 0 {
        ts2diff_encode(&p_begin, writer);
        ts2diff_encode(&p_delta, writer);
    }

    for record in records {
        if let Record::Matched { ops, .. } = record {
            for op in ops {
                writer.encode_bytes(&op.text);
            }
        }
    }
    for record in records {
        if let Record::Literal { bytes } = record {
            debug_assert!(!bytes.contains(&b'\n'), "literal line contains a newline");
            writer.encode_bytes(bytes);
            writer.encode(u32::from(b'\n'), 8);
        }
    }

    Ok(())
}

/// Shape of a matched record before its payload bytes are read.
struct PendingOp {
    position: usize,
    del_len: usize,
    ins_len: usize,
}

/// Deserialize the next block of records from `reader`.
///
/// Returns `None` at the end of the block sequence: either an explicit
/// `(0, 0)` count pair or end-of-stream while probing the first count.
pub fn decode_records(reader: &mut BitReader) -> Result<Option<Vec<Record>>> {
    let records0 = match reader.decode_u32() {
        Ok(value) => value as usize,
        Err(err) if err.is_underflow() => return Ok(None),
        Err(err) => return Err(err),
    };
    let records1 = reader.decode_u32()? as usize;
    if records0 == 0 && records1 == 0 {
        return Ok(None);
    }
    let total = records0 + records1;

    let method_len = reader.decode_u16()? as usize;
    let method_bytes = reader.decode_bytes(method_len)?;
    let interval_count = reader.decode_u32()? as usize;
    let method_bits = rle_decode(&method_bytes, interval_count)?;
    if method_bits.len() != total {
        return Err(OxiLogError::format(format!(
            "method column holds {} records, counts say {total}",
            method_bits.len()
        )));
    }
    if method_bits.iter().filter(|literal| !**literal).count() != records0 {
        return Err(OxiLogError::format(
            "method column disagrees with record counts",
        ));
    }

    let (references, op_counts) = if records0 > 0 {
        let len = reader.decode_u16()? as usize;
        let bytes = reader.decode_bytes(len)?;
        let references = bit_packing_decode(&bytes, records0)?;

        let len = reader.decode_u16()? as usize;
        let bytes = reader.decode_bytes(len)?;
        let op_counts = bit_packing_decode(&bytes, records0)?;
        (references, op_counts)
    } else {
        (Vec::new(), Vec::new())
    };

    let lengths = ts2diff_decode(reader)?;
    let expected_lengths: usize = op_counts.iter().map(|&c| c as usize * 2).sum();
    if lengths.len() != expected_lengths {
        return Err(OxiLogError::format(format!(
            "length column holds {} values, expected {expected_lengths}",
            lengths.len()
        )));
    }

    let (p_begin, p_delta) = if records0 > 0 {
        (ts2diff_decode(reader)?, ts2diff_decode(reader)?)
    } else {
        (Vec::new(), Vec::new())
    };
    let begin_expected = op_counts.iter().filter(|&&c| c > 0).count();
    let delta_expected: usize = op_counts.iter().map(|&c| (c as usize).saturating_sub(1)).sum();
    if p_begin.len() != begin_expected || p_delta.len() != delta_expected {
        return Err(OxiLogError::format(
            "position columns disagree with op counts",
        ));
    }

    let mut pending: Vec<(u32, Vec<PendingOp>)> = Vec::with_capacity(records0);
    let mut length_idx = 0;
    let mut begin_idx = 0;
    let mut delta_idx = 0;
    for k in 0..records0 {
        let op_count = op_counts[k] as usize;
        let del_lens = &lengths[length_idx..length_idx + op_count];
        let ins_lens = &lengths[length_idx + op_count..length_idx + 2 * op_count];
        length_idx += 2 * op_count;

        let mut ops = Vec::with_capacity(op_count);
        if op_count > 0 {
            let mut position = p_begin[begin_idx];
            begin_idx += 1;
            for idx in 0..op_count {
                if idx > 0 {
                    position = position.checked_add(p_delta[delta_idx]).ok_or_else(|| {
                        OxiLogError::format("operation position overflows")
                    })?;
                    delta_idx += 1;
                }
                ops.push(PendingOp {
                    position: to_usize(position, "operation position")?,
                    del_len: to_usize(del_lens[idx], "deletion length")?,
                    ins_len: to_usize(ins_lens[idx], "insertion length")?,
                });
            }
        }
        pending.push((references[k], ops));
    }

    let mut matched_records = Vec::with_capacity(records0);
    for (reference, shape) in pending {
        let mut ops = Vec::with_capacity(shape.len());
        for op in shape {
            let text = reader.decode_bytes(op.ins_len)?;
            ops.push(EditOp {
                position: op.position,
                del_len: op.del_len,
                text,
            });
        }
        matched_records.push(Record::Matched { reference, ops });
    }

    let mut literal_records = Vec::with_capacity(records1);
    for _ in 0..records1 {
        let mut bytes = Vec::new();
        loop {
            let byte = reader.decode_u8()?;
            if byte == b'\n' {
                break;
            }
            bytes.push(byte);
        }
        literal_records.push(Record::Literal { bytes });
    }

    let mut matched_iter = matched_records.into_iter();
    let mut literal_iter = literal_records.into_iter();
    let mut records = Vec::with_capacity(total);
    for is_literal in method_bits {
        let record = if is_literal {
            literal_iter.next()
        } else {
            matched_iter.next()
        };
        records.push(record.ok_or_else(|| {
            OxiLogError::format("method column disagrees with record counts")
        })?);
    }

    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(reference: u32, ops: Vec<EditOp>) -> Record {
        Record::Matched { reference, ops }
    }

    fn literal(bytes: &[u8]) -> Record {
        Record::Literal {
            bytes: bytes.to_vec(),
        }
    }

    fn roundtrip(records: Vec<Record>) {
        let mut writer = BitWriter::new();
        encode_records(&records, &mut writer).unwrap();
        let mut reader = BitReader::from_bytes(writer.into_bytes());
        let decoded = decode_records(&mut reader).unwrap().unwrap();
        assert_eq!(decoded, records);
        assert!(decode_records(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_roundtrip_mixed_records() {
        roundtrip(vec![
            literal(b"first line"),
            matched(0, vec![EditOp::new(3, 2, b"xy".to_vec())]),
            matched(
                1,
                vec![
                    EditOp::new(0, 1, b"A".to_vec()),
                    EditOp::new(5, 0, b"insert".to_vec()),
                    EditOp::new(9, 4, Vec::new()),
                ],
            ),
            literal(b"another literal"),
            matched(2, Vec::new()),
        ]);
    }

    #[test]
    fn test_roundtrip_only_literals() {
        roundtrip(vec![literal(b"a"), literal(b""), literal(b"ccc")]);
    }

    #[test]
    fn test_roundtrip_only_matched() {
        roundtrip(vec![
            matched(0, Vec::new()),
            matched(3, vec![EditOp::new(2, 1, b"z".to_vec())]),
            matched(7, Vec::new()),
        ]);
    }

    #[test]
    fn test_roundtrip_matched_without_ops() {
        // All op-lists empty: the position columns still carry their
        // ts2diff framing.
        roundtrip(vec![matched(0, Vec::new()), matched(1, Vec::new())]);
    }

    #[test]
    fn test_roundtrip_many_records() {
        let mut records = Vec::new();
        for i in 0..500u32 {
            if i % 3 == 0 {
                records.push(literal(format!("line number {i}").as_bytes()));
            } else {
                records.push(matched(
                    i % 8,
                    vec![EditOp::new((i % 10) as usize, 1, vec![b'0' + (i % 10) as u8])],
                ));
            }
        }
        roundtrip(records);
    }

    #[test]
    fn test_consecutive_blocks() {
        let first = vec![literal(b"block one")];
        let second = vec![matched(0, Vec::new()), literal(b"block two")];

        let mut writer = BitWriter::new();
        encode_records(&first, &mut writer).unwrap();
        encode_records(&second, &mut writer).unwrap();

        let mut reader = BitReader::from_bytes(writer.into_bytes());
        assert_eq!(decode_records(&mut reader).unwrap().unwrap(), first);
        assert_eq!(decode_records(&mut reader).unwrap().unwrap(), second);
        assert!(decode_records(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_end_of_stream_probe() {
        let mut reader = BitReader::from_bytes(Vec::new());
        assert!(decode_records(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_zero_counts_terminate() {
        let mut writer = BitWriter::new();
        writer.encode(0, 32);
        writer.encode(0, 32);
        let mut reader = BitReader::from_bytes(writer.into_bytes());
        assert!(decode_records(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_truncated_block_is_fatal() {
        let records = vec![literal(b"some line"), matched(0, Vec::new())];
        let mut writer = BitWriter::new();
        encode_records(&records, &mut writer).unwrap();
        let mut bytes = writer.into_bytes();
        bytes.truncate(bytes.len() - 4);

        let mut reader = BitReader::from_bytes(bytes);
        assert!(decode_records(&mut reader).is_err());
    }
}
