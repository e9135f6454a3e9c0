//! Substitution operations and their replay.
//!
//! Both aligners describe a target line as edits against a reference
//! line. An [`EditOp`] deletes `del_len` bytes at `position` of the
//! reference and inserts `text` in their place. Op lists are kept sorted
//! by position with disjoint, left-to-right deletion ranges.

use oxilog_core::error::{OxiLogError, Result};

/// A single substitution operation against a reference line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    /// Byte offset into the reference line.
    pub position: usize,
    /// Number of reference bytes replaced.
    pub del_len: usize,
    /// Replacement bytes; the insert length is `text.len()`.
    pub text: Vec<u8>,
}

impl EditOp {
    /// Create an operation.
    pub fn new(position: usize, del_len: usize, text: impl Into<Vec<u8>>) -> Self {
        Self {
            position,
            del_len,
            text: text.into(),
        }
    }
}

/// Replay `ops` against `reference`, producing the target line.
///
/// Operations must be sorted by position with non-overlapping deletion
/// ranges; anything else is reported as a format error.
pub fn apply_ops(ops: &[EditOp], reference: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(reference.len());
    let mut cursor = 0usize;

    for op in ops {
        let end = op.position.checked_add(op.del_len).ok_or_else(|| {
            OxiLogError::format("operation range overflows")
        })?;
        if op.position < cursor || end > reference.len() {
            return Err(OxiLogError::format(format!(
                "operation at {} (delete {}) outside reference of length {}",
                op.position,
                op.del_len,
                reference.len()
            )));
        }
        out.extend_from_slice(&reference[cursor..op.position]);
        out.extend_from_slice(&op.text);
        cursor = end;
    }

    out.extend_from_slice(&reference[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_oplist_is_identity() {
        let line = b"2025-01-01 INFO started";
        assert_eq!(apply_ops(&[], line).unwrap(), line);
    }

    #[test]
    fn test_single_substitution() {
        let ops = [EditOp::new(2, 1, b"d".to_vec())];
        assert_eq!(apply_ops(&ops, b"abc").unwrap(), b"abd");
    }

    #[test]
    fn test_pure_insert_and_delete() {
        let ops = [EditOp::new(1, 0, b"xyz".to_vec())];
        assert_eq!(apply_ops(&ops, b"ab").unwrap(), b"axyzb");

        let ops = [EditOp::new(0, 2, Vec::new())];
        assert_eq!(apply_ops(&ops, b"abcd").unwrap(), b"cd");
    }

    #[test]
    fn test_multiple_ops_in_order() {
        let ops = [
            EditOp::new(0, 1, b"X".to_vec()),
            EditOp::new(3, 2, b"YY".to_vec()),
        ];
        assert_eq!(apply_ops(&ops, b"abcdef").unwrap(), b"XbcYYf");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let ops = [EditOp::new(2, 5, Vec::new())];
        assert!(matches!(
            apply_ops(&ops, b"abc"),
            Err(OxiLogError::Format { .. })
        ));
    }

    #[test]
    fn test_overlapping_ops_rejected() {
        let ops = [
            EditOp::new(0, 3, b"x".to_vec()),
            EditOp::new(1, 1, b"y".to_vec()),
        ];
        assert!(apply_ops(&ops, b"abcdef").is_err());
    }
}
