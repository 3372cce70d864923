//! LZ78Y prediction estimate (SP800-90B §6.3.10).
//!
//! A dictionary-based predictor in the LZ78 family: every suffix of
//! length 1..=16 of the seen data maps to next-symbol counts, with the
//! dictionary frozen once it reaches 65536 prefixes. The guess is the
//! highest-count successor over all matching suffixes.

use std::collections::HashMap;

use super::prediction::{predictor_entropy, PredictorTally};
use crate::assessment::AssessmentError;

const TEST_NAME: &str = "lz78y_prediction";

/// Maximum suffix length tracked.
const MAX_PREFIX: usize = 16;

/// Dictionary size cap from the standard.
const MAX_DICT_ENTRIES: usize = 65_536;

/// Packs the `len`-suffix ending at `end` (exclusive) into a keyed
/// integer; the length tag keeps different-length suffixes distinct.
fn pack(symbols: &[u8], end: usize, len: usize) -> (u8, u128) {
    let mut k = 0u128;
    for &s in &symbols[end - len..end] {
        k = (k << 8) | s as u128;
    }
    (len as u8, k)
}

/// Computes the LZ78Y min-entropy estimate in bits per symbol.
/// Not applicable for sequences shorter than 18 symbols.
pub(crate) fn lz78y_estimate(symbols: &[u8]) -> Result<Option<f64>, AssessmentError> {
    let l = symbols.len();
    if l < MAX_PREFIX + 2 {
        return Ok(None);
    }

    let mut dict: HashMap<(u8, u128), HashMap<u8, u64>> = HashMap::new();
    let mut tally = PredictorTally::default();

    for pos in (MAX_PREFIX + 1)..l {
        // Train on the transition into the previous symbol: every
        // suffix ending just before it, longest first. New prefixes
        // are admitted only while the dictionary has room.
        for len in (1..=MAX_PREFIX).rev() {
            let key = pack(symbols, pos - 1, len);
            if let Some(entry) = dict.get_mut(&key) {
                *entry.entry(symbols[pos - 1]).or_insert(0) += 1;
            } else if dict.len() < MAX_DICT_ENTRIES {
                dict.insert(key, HashMap::from([(symbols[pos - 1], 1)]));
            }
        }

        // Predict: over all matching suffixes, take the successor with
        // the strictly highest count. Symbol-value ties break low so
        // the result never depends on hash iteration order.
        let mut prediction: Option<(u8, u64)> = None;
        for len in (1..=MAX_PREFIX).rev() {
            if let Some(entry) = dict.get(&pack(symbols, pos, len)) {
                let mut best: Option<(u8, u64)> = None;
                for (&sym, &count) in entry {
                    best = match best {
                        Some((bs, bc)) if count > bc || (count == bc && sym < bs) => {
                            Some((sym, count))
                        }
                        None => Some((sym, count)),
                        other => other,
                    };
                }
                if let Some((sym, count)) = best {
                    if prediction.map_or(true, |(_, pc)| count > pc) {
                        prediction = Some((sym, count));
                    }
                }
            }
        }

        tally.record(prediction.map(|(s, _)| s) == Some(symbols[pos]));
    }

    predictor_entropy(&tally, TEST_NAME)
}
