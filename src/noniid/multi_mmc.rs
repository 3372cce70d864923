//! MultiMMC prediction estimate (SP800-90B §6.3.9).
//!
//! Sixteen Markov-model sub-predictors of depth 1..=16. Each tracks
//! next-symbol counts conditioned on the most recent d-symbol prefix
//! and predicts the count-maximizing symbol; a scoreboard arbitrates.

use std::collections::HashMap;

use super::prediction::{predictor_entropy, PredictorTally};
use crate::assessment::AssessmentError;

const TEST_NAME: &str = "multi_mmc_prediction";

/// Model depths from the standard.
const DEPTHS: usize = 16;

/// Per-model cap on tracked prefixes, bounding memory on high-entropy
/// inputs.
const MAX_ENTRIES: usize = 100_000;

/// One depth-d Markov model. Prefixes pack into a u128 (at most 16
/// symbols of 8 bits), so lookups avoid hashing slices.
struct MmcModel {
    depth: usize,
    counts: HashMap<u128, HashMap<u8, u64>>,
}

impl MmcModel {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            counts: HashMap::new(),
        }
    }

    fn key(&self, symbols: &[u8], end: usize) -> u128 {
        let mut k = 0u128;
        for &s in &symbols[end - self.depth..end] {
            k = (k << 8) | s as u128;
        }
        k
    }

    /// Most probable next symbol after the prefix ending at `end`,
    /// with its count. Ties go to the smallest symbol value so the
    /// outcome never depends on hash iteration order.
    fn predict(&self, symbols: &[u8], end: usize) -> Option<(u8, u64)> {
        let next = self.counts.get(&self.key(symbols, end))?;
        let mut best: Option<(u8, u64)> = None;
        for (&sym, &count) in next {
            best = match best {
                Some((bs, bc)) if count > bc || (count == bc && sym < bs) => Some((sym, count)),
                None => Some((sym, count)),
                other => other,
            };
        }
        best
    }

    /// Records the observed transition prefix → `next`. New prefixes
    /// are only added while the model is below its entry cap; known
    /// prefixes keep counting regardless.
    fn train(&mut self, symbols: &[u8], end: usize, next: u8) {
        let key = self.key(symbols, end);
        if let Some(entry) = self.counts.get_mut(&key) {
            *entry.entry(next).or_insert(0) += 1;
        } else if self.counts.len() < MAX_ENTRIES {
            self.counts.insert(key, HashMap::from([(next, 1)]));
        }
    }
}

/// Computes the MultiMMC min-entropy estimate in bits per symbol.
/// Not applicable for fewer than three symbols.
pub(crate) fn multi_mmc_estimate(symbols: &[u8]) -> Result<Option<f64>, AssessmentError> {
    let l = symbols.len();
    if l < 3 {
        return Ok(None);
    }

    let mut models: Vec<MmcModel> = (1..=DEPTHS).map(MmcModel::new).collect();
    let mut scoreboard = [0u64; DEPTHS];
    let mut tally = PredictorTally::default();

    // Seed the depth-1 model with the first transition; predictions
    // are scored from the third symbol on.
    models[0].train(symbols, 1, symbols[1]);

    for pos in 2..l {
        let actual = symbols[pos];

        // Ties on the scoreboard go to the shallowest model.
        let mut winner = 0usize;
        for d in 1..DEPTHS {
            if scoreboard[d] > scoreboard[winner] {
                winner = d;
            }
        }
        let prediction = if models[winner].depth <= pos {
            models[winner].predict(symbols, pos).map(|(s, _)| s)
        } else {
            None
        };
        tally.record(prediction == Some(actual));

        for (d, model) in models.iter().enumerate() {
            if model.depth <= pos {
                if let Some((s, _)) = model.predict(symbols, pos) {
                    if s == actual {
                        scoreboard[d] += 1;
                    }
                }
            }
        }
        for model in models.iter_mut() {
            if model.depth <= pos {
                model.train(symbols, pos, actual);
            }
        }
    }

    predictor_entropy(&tally, TEST_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_is_not_applicable() {
        assert!(multi_mmc_estimate(&[1, 2]).unwrap().is_none());
    }

    #[test]
    fn test_constant_sequence_has_zero_entropy() {
        let h = multi_mmc_estimate(&[6u8; 1000]).unwrap().unwrap();
        assert!(h.abs() < 1e-9, "h = {h}");
    }

    #[test]
    fn test_deterministic_chain_is_fully_predicted() {
        // 0,1,2,3 repeating: the depth-1 chain is deterministic.
        let data: Vec<u8> = (0..2000).map(|i| (i % 4) as u8).collect();
        let h = multi_mmc_estimate(&data).unwrap().unwrap();
        assert!(h < 0.05, "h = {h}");
    }

    #[test]
    fn test_deeper_context_beats_shallow_one() {
        // Period-6 sequence that is ambiguous for shallow contexts but
        // deterministic at depth 4.
        let data: Vec<u8> = [0u8, 1, 0, 2, 0, 1].iter().cycle().take(3000).copied().collect();
        let h = multi_mmc_estimate(&data).unwrap().unwrap();
        assert!(h < 0.35, "h = {h}");
    }

    #[test]
    fn test_prediction_ties_are_deterministic() {
        let data: Vec<u8> = [3u8, 1, 3, 2, 3, 1, 3, 2].iter().cycle().take(400).copied().collect();
        let a = multi_mmc_estimate(&data).unwrap().unwrap();
        let b = multi_mmc_estimate(&data).unwrap().unwrap();
        assert_eq!(a, b);
    }
}
