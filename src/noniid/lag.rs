//! Lag prediction estimate (SP800-90B §6.3.8).
//!
//! 128 sub-predictors, one per lag: sub-predictor d guesses that the
//! next symbol repeats the symbol seen d steps back. Periodic sources
//! of any period up to 128 are caught by the matching lag.

use super::prediction::{predictor_entropy, PredictorTally};
use crate::assessment::AssessmentError;

const TEST_NAME: &str = "lag_prediction";

/// Number of lag sub-predictors.
const LAGS: usize = 128;

/// Computes the lag-prediction min-entropy estimate in bits per
/// symbol. Not applicable for fewer than two symbols.
pub(crate) fn lag_estimate(symbols: &[u8]) -> Result<Option<f64>, AssessmentError> {
    let l = symbols.len();
    if l < 2 {
        return Ok(None);
    }

    let mut scoreboard = [0u64; LAGS];
    let mut tally = PredictorTally::default();

    for pos in 1..l {
        // Ties on the scoreboard go to the smallest lag.
        let mut winner = 0usize;
        for d in 1..LAGS.min(pos) {
            if scoreboard[d] > scoreboard[winner] {
                winner = d;
            }
        }
        // Lag d predicts symbols[pos - 1 - d]; index 0 is lag 1.
        let prediction = symbols[pos - 1 - winner];
        let actual = symbols[pos];
        tally.record(prediction == actual);

        for d in 0..LAGS.min(pos) {
            if symbols[pos - 1 - d] == actual {
                scoreboard[d] += 1;
            }
        }
    }

    predictor_entropy(&tally, TEST_NAME)
}
