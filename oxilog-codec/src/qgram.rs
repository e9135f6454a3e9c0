//! Approximate aligner over common q-gram anchors.
//!
//! Instead of a full edit-distance computation, this aligner intersects
//! the padded q-gram multisets of the two lines, greedily pairs up
//! occurrences left to right, merges diagonal runs of pairs into anchor
//! intervals, and emits the gaps between consecutive anchors as
//! substitution operations. The synthetic cost `5 + Σ (3 + ins_len)` is
//! only used to reject a match in favor of a literal record.

use crate::ops::EditOp;
use std::collections::HashMap;

/// Left and right padding sentinels; distinct so boundary q-grams stay
/// positional.
const PAD_LEFT: u8 = b'$';
const PAD_RIGHT: u8 = b'#';

fn padded(s: &[u8], q: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 2 * (q - 1));
    out.extend(std::iter::repeat_n(PAD_LEFT, q - 1));
    out.extend_from_slice(s);
    out.extend(std::iter::repeat_n(PAD_RIGHT, q - 1));
    out
}

/// Occurrences of the common q-grams of one string, in position order.
/// Each entry is `(common gram index, gram position)`.
fn common_occurrences<'a>(
    grams: &[&'a [u8]],
    dict: &HashMap<&'a [u8], usize>,
) -> Vec<(usize, usize)> {
    grams
        .iter()
        .enumerate()
        .filter_map(|(pos, gram)| dict.get(gram).map(|&idx| (idx, pos)))
        .collect()
}

/// Derive an op-list aligning `str2` to `str1`, with the synthetic cost
/// used for the rejection test.
pub fn qgram_ops(str1: &[u8], str2: &[u8], q: usize) -> (Vec<EditOp>, f64) {
    debug_assert!(q >= 1, "q-gram length must be at least 1");

    if str1 == str2 {
        return (Vec::new(), 0.0);
    }

    let padded1 = padded(str1, q);
    let padded2 = padded(str2, q);
    let grams1: Vec<&[u8]> = padded1.windows(q).collect();
    let grams2: Vec<&[u8]> = padded2.windows(q).collect();

    let mut counts1: HashMap<&[u8], i32> = HashMap::new();
    for &gram in &grams1 {
        *counts1.entry(gram).or_insert(0) += 1;
    }
    let mut counts2: HashMap<&[u8], i32> = HashMap::new();
    for &gram in &grams2 {
        *counts2.entry(gram).or_insert(0) += 1;
    }

    let mut common: Vec<&[u8]> = counts1
        .keys()
        .filter(|gram| counts2.contains_key(*gram))
        .copied()
        .collect();
    common.sort_unstable();
    let dict: HashMap<&[u8], usize> = common
        .iter()
        .enumerate()
        .map(|(idx, &gram)| (gram, idx))
        .collect();

    let occurrences1 = common_occurrences(&grams1, &dict);
    let occurrences2 = common_occurrences(&grams2, &dict);

    // Greedily pair occurrences left to right, consuming each q-gram at
    // most min(count1, count2) times.
    let mut remaining2: Vec<i32> = common.iter().map(|gram| counts2[gram]).collect();
    let mut matches: Vec<(usize, usize)> = Vec::new();
    let mut index2 = 0;
    for &(gram_idx, pos1) in &occurrences1 {
        if remaining2[gram_idx] == 0 {
            continue;
        }
        while index2 < occurrences2.len() && occurrences2[index2].0 != gram_idx {
            remaining2[occurrences2[index2].0] -= 1;
            index2 += 1;
        }
        if index2 < occurrences2.len() {
            matches.push((pos1, occurrences2[index2].1));
            remaining2[gram_idx] -= 1;
            index2 += 1;
        }
    }

    // Merge match pairs into maximal diagonal runs, scanning from the
    // highest coordinates down. Runs closer than q positions in either
    // string are dropped as overlap.
    let qm1 = q as i64 - 1;
    let mut runs: Vec<((i64, i64), (i64, i64))> = Vec::new();
    matches.reverse();
    if let Some(&(fx, fy)) = matches.first() {
        let mut begin = (fx as i64, fy as i64);
        let mut low = begin;
        for &(x, y) in &matches[1..] {
            let item = (x as i64, y as i64);
            if low.0 == item.0 + 1 && low.1 == item.1 + 1 {
                low = item;
            } else if low.0 > item.0 + qm1 && low.1 > item.1 + qm1 {
                runs.push((begin, low));
                begin = item;
                low = item;
            }
        }
        runs.push((begin, low));
    }

    // Convert runs in padded q-gram coordinates to anchor intervals in
    // string coordinates.
    let len1 = str1.len() as i64;
    let len2 = str2.len() as i64;
    let mut anchors: Vec<(i64, i64, i64, i64)> = runs
        .iter()
        .map(|&(begin, low)| {
            let x_begin = (low.0 - qm1).max(0);
            let x_end = begin.0.min(len1 - 1);
            let y_begin = (low.1 - qm1).max(0);
            let y_end = begin.1.min(len2 - 1);
            (x_begin, x_end, y_begin, y_end)
        })
        .collect();
    anchors.reverse();

    // The gaps between consecutive anchors are the edit operations.
    let mut ops = Vec::new();
    let mut prev = (-1i64, -1i64, -1i64, -1i64);
    for &anchor in &anchors {
        if anchor.0 != 0 || anchor.2 != 0 {
            let position = (prev.1 + 1) as usize;
            let del_len = (anchor.0 - prev.1 - 1) as usize;
            let text = str2[(prev.3 + 1) as usize..anchor.2 as usize].to_vec();
            ops.push(EditOp::new(position, del_len, text));
        }
        prev = anchor;
    }
    if len1 != prev.1 + 1 || len2 != prev.3 + 1 {
        let position = (prev.1 + 1) as usize;
        let del_len = (len1 - prev.1 - 1) as usize;
        let text = str2[(prev.3 + 1) as usize..].to_vec();
        ops.push(EditOp::new(position, del_len, text));
    }

    let cost = 5.0 + ops
        .iter()
        .map(|op| 3.0 + op.text.len() as f64)
        .sum::<f64>();

    (ops, cost)
}
