//! Line-to-line similarity measures.
//!
//! Three selectable distances, each returning a value in `[0, 1]` with
//! `0` meaning identical. The MinHash variant caches per-line signatures;
//! the pipeline clears the cache at block boundaries so it never outlives
//! the lines it describes.

use crate::qgram::qgram_ops;
use oxilog_core::error::{OxiLogError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// The 64-bit FNV prime, used as the modulus of the MinHash functions.
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Seed for the fixed hash-function coefficients.
const COEFFICIENT_SEED: u64 = 12345;

/// Number of hash functions in a MinHash signature.
pub const DEFAULT_NUM_HASHES: usize = 50;

/// Selectable distance function.
///
/// The identifiers are stored in bits `[6:4]` of the header params byte
/// and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceKind {
    /// Cosine distance over q-gram count vectors.
    Cosine,
    /// MinHash estimate of Jaccard distance over q-gram sets.
    #[default]
    Minhash,
    /// Normalized cost of the approximate q-gram aligner.
    Qgram,
}

impl DistanceKind {
    /// Stable wire identifier.
    pub fn id(&self) -> u8 {
        match self {
            Self::Cosine => 0,
            Self::Minhash => 1,
            Self::Qgram => 2,
        }
    }

    /// Inverse of [`DistanceKind::id`]; fails on unknown identifiers.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Cosine),
            1 => Ok(Self::Minhash),
            2 => Ok(Self::Qgram),
            other => Err(OxiLogError::format(format!("unknown distance id {other}"))),
        }
    }

    /// Distance function name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Minhash => "minhash",
            Self::Qgram => "qgram",
        }
    }
}

impl std::fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// DJB2 hash of a q-gram, the base value fed into every hash function.
fn djb2(bytes: &[u8]) -> u64 {
    let mut hash = 5381u64;
    for &byte in bytes {
        hash = (hash << 5).wrapping_add(hash).wrapping_add(u64::from(byte));
    }
    hash
}

/// MinHash signatures over q-gram sets.
///
/// A value type: the hash-function coefficients are derived from a fixed
/// seed at construction, and the signature cache belongs to this instance
/// alone.
#[derive(Debug)]
pub struct MinHasher {
    q: usize,
    coeff_a: Vec<u64>,
    coeff_b: Vec<u64>,
    cache: HashMap<Vec<u8>, Vec<u64>>,
}

impl MinHasher {
    /// Create a hasher for q-grams of length `q` with `num_hashes` hash
    /// functions.
    pub fn new(q: usize, num_hashes: usize) -> Self {
        let mut rng = SmallRng::seed_from_u64(COEFFICIENT_SEED);
        let coeff_a = (0..num_hashes).map(|_| rng.random::<u64>()).collect();
        let coeff_b = (0..num_hashes).map(|_| rng.random::<u64>()).collect();
        Self {
            q,
            coeff_a,
            coeff_b,
            cache: HashMap::new(),
        }
    }

    /// Drop all cached signatures.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn compute_signature(&self, line: &[u8]) -> Vec<u64> {
        let mut signature = vec![u64::MAX; self.coeff_a.len()];
        for gram in line.windows(self.q) {
            let base = djb2(gram);
            for (slot, (&a, &b)) in signature
                .iter_mut()
                .zip(self.coeff_a.iter().zip(self.coeff_b.iter()))
            {
                let hash = a.wrapping_mul(base).wrapping_add(b) % FNV_PRIME;
                *slot = (*slot).min(hash);
            }
        }
        signature
    }

    fn signature(&mut self, line: &[u8]) -> &[u64] {
        if !self.cache.contains_key(line) {
            let signature = self.compute_signature(line);
            self.cache.insert(line.to_vec(), signature);
        }
        &self.cache[line]
    }

    /// Estimated Jaccard distance between two lines.
    pub fn distance(&mut self, a: &[u8], b: &[u8]) -> f64 {
        if a == b {
            return 0.0;
        }
        if a.len() < self.q || b.len() < self.q {
            return 1.0;
        }

        let sig_a = self.signature(a).to_vec();
        let sig_b = self.signature(b);
        let matches = sig_a
            .iter()
            .zip(sig_b.iter())
            .filter(|(x, y)| x == y)
            .count();
        1.0 - matches as f64 / sig_a.len() as f64
    }
}

fn qgram_counts(s: &[u8], q: usize) -> HashMap<&[u8], u32> {
    let mut counts = HashMap::new();
    for gram in s.windows(q) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Cosine distance between the q-gram count vectors of two lines.
pub fn cosine_distance(a: &[u8], b: &[u8], q: usize) -> f64 {
    if a == b && !a.is_empty() {
        return 0.0;
    }

    let counts_a = qgram_counts(a, q);
    let counts_b = qgram_counts(b, q);

    let dot: f64 = counts_a
        .iter()
        .filter_map(|(gram, &count)| {
            counts_b
                .get(gram)
                .map(|&other| f64::from(count) * f64::from(other))
        })
        .sum();

    let norm_a: f64 = counts_a
        .values()
        .map(|&c| f64::from(c) * f64::from(c))
        .sum::<f64>()
        .sqrt();
    let norm_b: f64 = counts_b
        .values()
        .map(|&c| f64::from(c) * f64::from(c))
        .sum::<f64>()
        .sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Q-gram aligner cost normalized by the longer line length.
pub fn qgram_distance(a: &[u8], b: &[u8], q: usize) -> f64 {
    if a == b {
        return 0.0;
    }
    let (_, cost) = qgram_ops(a, b, q);
    let max_len = a.len().max(b.len());
    (cost / max_len as f64).min(1.0)
}

/// One similarity measure with its per-block state.
///
/// The MinHash signature cache lives here; [`SimilarityMeasure::reset`]
/// is called at every block boundary.
#[derive(Debug)]
pub struct SimilarityMeasure {
    kind: DistanceKind,
    q: usize,
    minhash: MinHasher,
}

impl SimilarityMeasure {
    /// Create a measure of the given kind over q-grams of length `q`.
    pub fn new(kind: DistanceKind, q: usize) -> Self {
        Self {
            kind,
            q,
            minhash: MinHasher::new(q, DEFAULT_NUM_HASHES),
        }
    }

    /// Distance between two lines in `[0, 1]`.
    pub fn distance(&mut self, a: &[u8], b: &[u8]) -> f64 {
        match self.kind {
            DistanceKind::Cosine => cosine_distance(a, b, self.q),
            DistanceKind::Minhash => self.minhash.distance(a, b),
            DistanceKind::Qgram => qgram_distance(a, b, self.q),
        }
    }

    /// Invalidate per-block caches.
    pub fn reset(&mut self) {
        self.minhash.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_A: &[u8] = b"Jun  9 06:06:51 combo anacron: anacron startup succeeded";
    const LINE_B: &[u8] = b"Jun  9 06:06:51 combo atd: atd startup succeeded";

    fn all_kinds() -> [DistanceKind; 3] {
        [DistanceKind::Cosine, DistanceKind::Minhash, DistanceKind::Qgram]
    }

    #[test]
    fn test_identical_lines_are_distance_zero() {
        for kind in all_kinds() {
            let mut measure = SimilarityMeasure::new(kind, 3);
            assert_eq!(measure.distance(LINE_A, LINE_A), 0.0, "kind {kind}");
            assert_eq!(measure.distance(b"ab", b"ab"), 0.0, "short line, kind {kind}");
        }
    }

    #[test]
    fn test_distances_stay_in_unit_interval() {
        let pairs: [(&[u8], &[u8]); 5] = [
            (LINE_A, LINE_B),
            (b"", b"abc"),
            (b"abc", b""),
            (b"x", b"y"),
            (b"same prefix 1", b"same prefix 2"),
        ];
        for kind in all_kinds() {
            let mut measure = SimilarityMeasure::new(kind, 3);
            for (a, b) in pairs {
                let d = measure.distance(a, b);
                assert!((0.0..=1.0).contains(&d), "kind {kind}: d={d}");
            }
        }
    }

    #[test]
    fn test_symmetry() {
        for kind in [DistanceKind::Cosine, DistanceKind::Minhash] {
            let mut measure = SimilarityMeasure::new(kind, 3);
            let d1 = measure.distance(LINE_A, LINE_B);
            let d2 = measure.distance(LINE_B, LINE_A);
            assert_eq!(d1, d2, "kind {kind}");
        }
    }

    #[test]
    fn test_similar_lines_closer_than_dissimilar() {
        for kind in all_kinds() {
            let mut measure = SimilarityMeasure::new(kind, 3);
            let close = measure.distance(LINE_A, LINE_B);
            let far = measure.distance(LINE_A, b"0123456789 totally unrelated content xyz");
            assert!(close < far, "kind {kind}: close={close} far={far}");
        }
    }

    #[test]
    fn test_too_short_lines_are_maximal() {
        let mut hasher = MinHasher::new(3, DEFAULT_NUM_HASHES);
        assert_eq!(hasher.distance(b"ab", b"abcdef"), 1.0);
        assert_eq!(cosine_distance(b"ab", b"abcdef", 3), 1.0);
        assert_eq!(cosine_distance(b"", b"", 3), 1.0);
    }

    #[test]
    fn test_minhash_deterministic_across_instances() {
        let mut first = MinHasher::new(3, DEFAULT_NUM_HASHES);
        let mut second = MinHasher::new(3, DEFAULT_NUM_HASHES);
        assert_eq!(first.distance(LINE_A, LINE_B), second.distance(LINE_A, LINE_B));
    }

    #[test]
    fn test_minhash_cache_cleared() {
        let mut hasher = MinHasher::new(3, DEFAULT_NUM_HASHES);
        let before = hasher.distance(LINE_A, LINE_B);
        hasher.clear_cache();
        assert!(hasher.cache.is_empty());
        assert_eq!(hasher.distance(LINE_A, LINE_B), before);
    }

    #[test]
    fn test_distance_kind_ids() {
        for kind in all_kinds() {
            assert_eq!(DistanceKind::from_id(kind.id()).unwrap(), kind);
        }
        assert!(DistanceKind::from_id(3).is_err());
    }
}
