//! Shared machinery for the prediction estimators (SP800-90B §6.3.7 –
//! §6.3.10).
//!
//! Each predictor simulates online guessing of the next symbol and
//! feeds its outcomes through a common tally. The entropy estimate
//! combines a 99% upper bound on the global correct-guess rate with a
//! "local" bound derived from the longest run of correct guesses.

use crate::assessment::AssessmentError;
use crate::numeric::{bisect, proportion_upper_bound};

/// Records prediction outcomes: total, correct, and the longest streak
/// of consecutive correct guesses.
#[derive(Debug, Default, Clone)]
pub(crate) struct PredictorTally {
    pub predictions: u64,
    pub correct: u64,
    pub longest_run: u64,
    current_run: u64,
}

impl PredictorTally {
    pub(crate) fn record(&mut self, was_correct: bool) {
        self.predictions += 1;
        if was_correct {
            self.correct += 1;
            self.current_run += 1;
            if self.current_run > self.longest_run {
                self.longest_run = self.current_run;
            }
        } else {
            self.current_run = 0;
        }
    }
}

/// Converts a tally into a min-entropy estimate in bits per symbol.
///
/// Returns `Ok(None)` when fewer than two predictions were made.
pub(crate) fn predictor_entropy(
    tally: &PredictorTally,
    test: &'static str,
) -> Result<Option<f64>, AssessmentError> {
    let n = tally.predictions;
    if n < 2 {
        return Ok(None);
    }
    let nf = n as f64;

    let p_global = if tally.correct == 0 {
        // No correct guesses: 99% bound on a zero-success binomial.
        1.0 - 0.01f64.powf(1.0 / nf)
    } else {
        proportion_upper_bound(tally.correct as f64 / nf, n as usize)
    };

    // Local predictability from the longest correct run. A run longer
    // than the prediction count cannot occur; a run equal to it leaves
    // the recurrence for "no run of length r+1" degenerate, and the
    // global bound is already 1 there.
    let r = tally.longest_run + 1;
    let p_local = if r > n {
        0.0
    } else {
        solve_local_probability(r as f64, nf, test)?
    };

    let p = p_global.max(p_local);
    Ok(Some(-p.log2()))
}

/// Finds p such that the probability of seeing no run of `r`
/// consecutive successes in `n` trials equals 0.99.
///
/// Uses the standard's recurrence: x is the dominant root of
/// `1 − x + q·p^r·x^{r+1} = 0`, found by fixed-point iteration, and
///
/// ```text
/// P_norun = (1 − p·x) / ((r + 1 − r·x)·q) · x^{−(n+1)}
/// ```
///
/// P_norun is decreasing in p, so the equation inverts by bisection.
fn solve_local_probability(
    r: f64,
    n: f64,
    test: &'static str,
) -> Result<f64, AssessmentError> {
    let p_norun = |p: f64| {
        let q = 1.0 - p;
        let mut x = 1.0f64;
        for _ in 0..10 {
            x = 1.0 + q * p.powf(r) * x.powf(r + 1.0);
        }
        let val = (1.0 - p * x) / ((r + 1.0 - r * x) * q) * (-(n + 1.0) * x.ln()).exp();
        // Divergent fixed point means runs are effectively certain.
        if val.is_finite() {
            val.clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    bisect(p_norun, 0.99, 1e-12, 1.0 - 1e-12, test)
}
