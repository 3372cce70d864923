//! Markov estimate (SP800-90B §6.3.3).
//!
//! Builds the first-order transition matrix of the binary expansion
//! and bounds entropy by the most probable 128-step sequence. The six
//! candidate sequence classes from the standard are evaluated in log2
//! domain so long runs of small probabilities cannot underflow.

/// Length of the bounding sequence from the standard.
const SEQ_LEN: f64 = 128.0;

/// Computes the Markov min-entropy estimate in bits per bit.
///
/// Returns `None` for sequences too short to observe a transition.
pub(crate) fn markov_estimate(bits: &[u8]) -> Option<f64> {
    let l = bits.len();
    if l < 2 {
        return None;
    }

    let ones = bits.iter().map(|&b| b as u64).sum::<u64>();
    let p1 = ones as f64 / l as f64;
    let p0 = 1.0 - p1;

    // Transition counts over consecutive pairs.
    let mut n = [[0u64; 2]; 2];
    for w in bits.windows(2) {
        n[w[0] as usize][w[1] as usize] += 1;
    }
    let from0 = (n[0][0] + n[0][1]) as f64;
    let from1 = (n[1][0] + n[1][1]) as f64;
    let p00 = if from0 > 0.0 { n[0][0] as f64 / from0 } else { 0.0 };
    let p01 = if from0 > 0.0 { n[0][1] as f64 / from0 } else { 0.0 };
    let p10 = if from1 > 0.0 { n[1][0] as f64 / from1 } else { 0.0 };
    let p11 = if from1 > 0.0 { n[1][1] as f64 / from1 } else { 0.0 };

    // log2-probabilities of the six most-probable-sequence classes of
    // length 128: constant runs, alternations, and single-switch
    // sequences starting from either bit. Zero factors map to -inf and
    // drop out of the max.
    let lg = |p: f64| p.log2();
    let candidates = [
        lg(p0) + 127.0 * lg(p00),
        lg(p0) + 64.0 * lg(p01) + 63.0 * lg(p10),
        lg(p0) + lg(p01) + 126.0 * lg(p11),
        lg(p1) + lg(p10) + 126.0 * lg(p00),
        lg(p1) + 64.0 * lg(p10) + 63.0 * lg(p01),
        lg(p1) + 127.0 * lg(p11),
    ];
    let best = candidates
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    Some((-best / SEQ_LEN).min(1.0))
}
