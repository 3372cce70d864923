//! Most Common Value estimate (SP800-90B §6.3.1).
//!
//! The simplest estimator and the only one that runs on every input:
//! the min-entropy implied by the most frequent symbol's observed
//! probability, with a 99% upper confidence bound on that probability.

use crate::numeric::proportion_upper_bound;

/// Computes the MCV min-entropy estimate in bits per symbol.
///
/// Requires at least two symbols (enforced at the assessment entry).
pub(crate) fn mcv_estimate(symbols: &[u8]) -> f64 {
    let mut counts = [0u64; 256];
    for &s in symbols {
        counts[s as usize] += 1;
    }
    let c_max = counts.iter().copied().max().unwrap_or(0);
    let p_hat = c_max as f64 / symbols.len() as f64;
    let p_upper = proportion_upper_bound(p_hat, symbols.len());
    -p_upper.log2()
}
