//! Fixed-width bit packing for non-negative integer vectors.
//!
//! Every value is stored with the minimum bit width that fits the largest
//! element. The width itself is written as a single leading byte, so the
//! decoder only needs the element count from its caller.

use oxilog_core::bitstream::{BitReader, BitWriter};
use oxilog_core::error::{OxiLogError, Result};

/// Minimum number of bits needed to represent `value`, floored at 1.
fn bit_width_for(value: u32) -> u8 {
    let width = 32 - value.leading_zeros() as u8;
    width.max(1)
}

/// Pack `values` at the minimum common bit width.
///
/// Layout: one byte holding the bit width, then each value MSB-first,
/// zero-padded to a byte boundary. An empty slice encodes to an empty
/// byte sequence.
pub fn bit_packing_encode(values: &[u32]) -> Vec<u8> {
    let Some(max) = values.iter().copied().max() else {
        return Vec::new();
    };
    let bit_width = bit_width_for(max);

    let mut writer = BitWriter::new();
    writer.encode(u32::from(bit_width), 8);
    for &value in values {
        writer.encode(value, bit_width);
    }
    writer.into_bytes()
}

/// Unpack exactly `count` values from `bytes`.
///
/// `count == 0` yields an empty vector without touching `bytes`.
pub fn bit_packing_decode(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut reader = BitReader::from_bytes(bytes.to_vec());
    let bit_width = reader.decode_u8()?;
    if bit_width == 0 || bit_width > 32 {
        return Err(OxiLogError::format(format!(
            "bit packing width out of range: {bit_width}"
        )));
    }

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(reader.decode(bit_width)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let values = [5u32, 7, 3, 3, 4, 2, 4, 2, 5, 12, 23];
        let encoded = bit_packing_encode(&values);
        let decoded = bit_packing_decode(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_encoded_length() {
        // 1 header byte plus ceil(width * count / 8) payload bytes.
        let values = [5u32, 7, 3, 3, 4, 2, 4, 2, 5, 12, 23];
        let encoded = bit_packing_encode(&values);
        assert_eq!(encoded.len(), 1 + (5 * values.len()).div_ceil(8));
        assert_eq!(encoded[0], 5);
    }

    #[test]
    fn test_all_zeros_uses_width_one() {
        let values = [0u32; 16];
        let encoded = bit_packing_encode(&values);
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded.len(), 1 + 2);
        let decoded = bit_packing_decode(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_empty_input() {
        assert!(bit_packing_encode(&[]).is_empty());
        assert_eq!(bit_packing_decode(&[], 0).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_large_values() {
        let values = [u32::MAX, 0, 1, u32::MAX - 1];
        let encoded = bit_packing_encode(&values);
        assert_eq!(encoded[0], 32);
        let decoded = bit_packing_decode(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_invalid_width_rejected() {
        let err = bit_packing_decode(&[0, 0xFF], 1).unwrap_err();
        assert!(matches!(err, OxiLogError::Format { .. }));
        let err = bit_packing_decode(&[40, 0xFF], 1).unwrap_err();
        assert!(matches!(err, OxiLogError::Format { .. }));
    }

    #[test]
    fn test_truncated_payload_underflows() {
        let values = [1000u32; 8];
        let mut encoded = bit_packing_encode(&values);
        encoded.truncate(encoded.len() - 1);
        assert!(bit_packing_decode(&encoded, values.len()).is_err());
    }
}
