//! Collision estimate (SP800-90B §6.3.2).
//!
//! Models entropy from the average gap between repeated values. For a
//! binary source the mean time to the first collision is `2 + 2p(1−p)`,
//! a monotone function of the most-probable-bit probability p, so the
//! lower-bounded mean gap inverts to a conservative p. Runs on the
//! binary expansion only, per the standard.

use crate::assessment::AssessmentError;
use crate::numeric::{bisect, Z_99};

const TEST_NAME: &str = "collision";

/// Computes the collision min-entropy estimate in bits per bit.
///
/// Returns `Ok(None)` when the sequence yields fewer than two
/// collision segments (too short to bound a mean).
pub(crate) fn collision_estimate(bits: &[u8]) -> Result<Option<f64>, AssessmentError> {
    // Parse into segments, each ending at the first repeated value.
    // For binary data a segment is 2 symbols (immediate repeat) or 3
    // (the third bit must match one of the first two).
    let mut lengths: Vec<u64> = Vec::new();
    let mut i = 0;
    while i + 1 < bits.len() {
        if bits[i] == bits[i + 1] {
            lengths.push(2);
            i += 2;
        } else if i + 2 < bits.len() {
            lengths.push(3);
            i += 3;
        } else {
            break;
        }
    }

    let v = lengths.len();
    if v < 2 {
        return Ok(None);
    }

    let vf = v as f64;
    let sum: u64 = lengths.iter().sum();
    let mean = sum as f64 / vf;
    let var = lengths
        .iter()
        .map(|&t| (t as f64 - mean).powi(2))
        .sum::<f64>()
        / (vf - 1.0);
    let mean_lower = mean - Z_99 * var.sqrt() / vf.sqrt();

    // Invert E[t] = 2 + 2p(1−p) over p ∈ [0.5, 1]. The function is
    // strictly decreasing on that interval, from 2.5 down to 2, so a
    // lower-bounded mean above 2.5 means full entropy (p = 0.5) and a
    // mean at or below 2 pins p to 1.
    let p = bisect(
        |p| 2.0 + 2.0 * p * (1.0 - p),
        mean_lower,
        0.5,
        1.0,
        TEST_NAME,
    )?;

    Ok(Some(-p.log2()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_bits_give_zero_entropy() {
        // All-same bits collide every 2 symbols: mean gap 2, p = 1.
        let h = collision_estimate(&[1u8; 64]).unwrap().unwrap();
        assert!(h < 1e-6, "h = {h}");
    }

    #[test]
    fn test_alternating_bits_give_low_entropy() {
        // 0101... never collides at distance 1; every segment has
        // length 3, so the mean gap reaches its maximum and the lower
        // confidence bound still lands above 2.5: the estimator cannot
        // distinguish this from ideal and reports full entropy. The
        // Markov and prediction estimators catch this pattern instead.
        let bits: Vec<u8> = (0..300).map(|i| (i % 2) as u8).collect();
        let h = collision_estimate(&bits).unwrap().unwrap();
        assert!((h - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_short_sequence_is_not_applicable() {
        assert!(collision_estimate(&[0, 1]).unwrap().is_none());
        assert!(collision_estimate(&[1]).unwrap().is_none());
    }

    #[test]
    fn test_matches_closed_form_inverse() {
        // Mixed data: verify the bisection agrees with the quadratic
        // closed form p = 0.5 + sqrt(1.25 − X̄'/2).
        let bits: Vec<u8> = [0u8, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1]
            .iter()
            .cycle()
            .take(4096)
            .copied()
            .collect();
        let h = collision_estimate(&bits).unwrap().unwrap();

        // Recompute the statistic by hand.
        let mut lengths = Vec::new();
        let mut i = 0;
        while i + 1 < bits.len() {
            if bits[i] == bits[i + 1] {
                lengths.push(2u64);
                i += 2;
            } else if i + 2 < bits.len() {
                lengths.push(3);
                i += 3;
            } else {
                break;
            }
        }
        let v = lengths.len() as f64;
        let mean = lengths.iter().sum::<u64>() as f64 / v;
        let var = lengths
            .iter()
            .map(|&t| (t as f64 - mean).powi(2))
            .sum::<f64>()
            / (v - 1.0);
        let x = mean - Z_99 * var.sqrt() / v.sqrt();
        let p = if x >= 2.5 {
            0.5
        } else if x <= 2.0 {
            1.0
        } else {
            0.5 + (1.25 - x / 2.0).sqrt()
        };
        assert!((h - (-p.log2())).abs() < 1e-6);
    }
}
