//! Compression estimate (SP800-90B §6.3.4).
//!
//! A Maurer-style universal statistic: the binary expansion is cut
//! into 6-bit blocks, the first 1000 blocks prime a last-occurrence
//! dictionary, and the mean log2 gap to each test block's previous
//! occurrence bounds the per-block probability. The bound inverts to a
//! probability by bisection over the standard's two-parameter
//! near-uniform family.

use crate::assessment::AssessmentError;
use crate::numeric::{bisect, Z_99};

const TEST_NAME: &str = "compression";

/// Bits per dictionary block.
const BLOCK_BITS: usize = 6;
/// Number of blocks used to initialize the dictionary.
const DICT_BLOCKS: usize = 1000;
/// Block alphabet size.
const BLOCK_ALPHABET: f64 = 64.0;

/// Computes the compression min-entropy estimate in bits per bit.
///
/// Returns `Ok(None)` when the expansion yields fewer than two test
/// blocks beyond the dictionary-priming prefix.
pub(crate) fn compression_estimate(bits: &[u8]) -> Result<Option<f64>, AssessmentError> {
    let blocks: Vec<u8> = bits
        .chunks_exact(BLOCK_BITS)
        .map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect();
    let n = blocks.len();
    if n < DICT_BLOCKS + 2 {
        return Ok(None);
    }
    let d = DICT_BLOCKS;
    let v = n - d;
    let vf = v as f64;

    // Last-occurrence index per block value, 1-based; 0 = unseen.
    let mut last = [0usize; 64];
    for (i, &b) in blocks.iter().take(d).enumerate() {
        last[b as usize] = i + 1;
    }

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for (i, &b) in blocks.iter().enumerate().skip(d) {
        let idx = i + 1;
        let dist = if last[b as usize] > 0 {
            idx - last[b as usize]
        } else {
            idx
        };
        let lg = (dist as f64).log2();
        sum += lg;
        sum_sq += lg * lg;
        last[b as usize] = idx;
    }

    let mean = sum / vf;
    // Variance correction factor from the standard (b = 6).
    let b = BLOCK_BITS as f64;
    let c = 0.7 - 0.8 / b + (4.0 + 32.0 / b) * vf.powf(-3.0 / b) / 15.0;
    let sigma = c * (sum_sq / vf - mean * mean).max(0.0).sqrt();
    let mean_lower = mean - Z_99 * sigma / vf.sqrt();

    // Solve X̄' = G(p) + 63·G(q) with q = (1−p)/63 for p ∈ [1/64, 1).
    // The expectation is strictly decreasing in p.
    let expectation = |p: f64| {
        let q = (1.0 - p) / (BLOCK_ALPHABET - 1.0);
        g_single(p, d, v) + (BLOCK_ALPHABET - 1.0) * g_single(q, d, v)
    };
    let p = bisect(expectation, mean_lower, 1.0 / BLOCK_ALPHABET, 1.0 - 1e-9, TEST_NAME)?;

    Ok(Some((-p.log2() / b).min(1.0)))
}

/// Contribution of one block value with probability `z` to the
/// expected Maurer statistic.
///
/// Direct evaluation of the standard's double sum is O(v²); this is
/// the equivalent single-pass form. With w = 1−z:
///
/// ```text
/// G(z) = (1/v)·[ z²·Σ_{t=d+1}^{n} S(t−1) + z·Σ_{t=d+1}^{n} log2(t)·w^{t−1} ]
/// S(m) = Σ_{u=1}^{m} log2(u)·w^{u−1}
/// ```
///
/// Once w^{u−1} underflows to zero S stops changing, so the remaining
/// outer terms collapse to a multiple of the stabilized prefix sum.
fn g_single(z: f64, d: usize, v: usize) -> f64 {
    let w = 1.0 - z;
    let n = d + v;
    let mut s = 0.0;
    let mut pow = 1.0; // w^{u−1}
    let mut sum_s = 0.0;
    let mut sum_b = 0.0;
    let mut u = 1usize;
    while u <= n {
        if pow == 0.0 {
            // Tail: log terms vanish, S(t−1) is constant.
            let first = u.max(d);
            if first <= n - 1 {
                sum_s += s * ((n - first) as f64);
            }
            break;
        }
        let term = (u as f64).log2() * pow;
        s += term;
        if u > d {
            sum_b += term;
        }
        if u >= d && u < n {
            sum_s += s;
        }
        pow *= w;
        u += 1;
    }
    (z * z * sum_s + z * sum_b) / v as f64
}
