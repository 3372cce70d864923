//! MultiMCW prediction estimate (SP800-90B §6.3.7).
//!
//! Four sub-predictors each guess the most common value within a
//! sliding window of the recent past (ties to the most recent value).
//! A scoreboard tracks which sub-predictor has been right most often
//! and its guess is the battery's guess.

use super::prediction::{predictor_entropy, PredictorTally};
use crate::assessment::AssessmentError;

const TEST_NAME: &str = "multi_mcw_prediction";

/// Window sizes from the standard.
const WINDOWS: [usize; 4] = [63, 255, 1023, 4095];

/// Tracks the most common value in a sliding window without a full
/// alphabet rescan per step: the running winner is updated on
/// increments and recomputed only when its own count decays.
struct McwWindow {
    size: usize,
    counts: [u32; 256],
    last_seen: [usize; 256],
    mcv: u8,
}

impl McwWindow {
    fn new(size: usize) -> Self {
        Self {
            size,
            counts: [0; 256],
            last_seen: [0; 256],
            mcv: 0,
        }
    }

    /// Current prediction: most common value, ties to most recent.
    fn predict(&self) -> u8 {
        self.mcv
    }

    /// Slides the window forward over `symbols` so it ends just before
    /// position `pos` (exclusive), having previously ended before
    /// `pos − 1`.
    fn advance(&mut self, symbols: &[u8], pos: usize) {
        let entering = symbols[pos - 1] as usize;
        self.counts[entering] += 1;
        self.last_seen[entering] = pos - 1;
        if pos > self.size {
            let leaving = symbols[pos - self.size - 1] as usize;
            self.counts[leaving] -= 1;
            if leaving == self.mcv as usize {
                self.rescan();
                return;
            }
        }
        let m = self.mcv as usize;
        if self.counts[entering] > self.counts[m]
            || (self.counts[entering] == self.counts[m] && self.last_seen[entering] >= self.last_seen[m])
        {
            self.mcv = entering as u8;
        }
    }

    fn rescan(&mut self) {
        let mut best = 0usize;
        for v in 1..256 {
            if self.counts[v] > self.counts[best]
                || (self.counts[v] == self.counts[best] && self.last_seen[v] > self.last_seen[best])
            {
                best = v;
            }
        }
        self.mcv = best as u8;
    }
}

/// Computes the MultiMCW min-entropy estimate in bits per symbol.
///
/// Not applicable when the sequence is no longer than the smallest
/// window.
pub(crate) fn multi_mcw_estimate(symbols: &[u8]) -> Result<Option<f64>, AssessmentError> {
    let l = symbols.len();
    if l <= WINDOWS[0] {
        return Ok(None);
    }

    let mut windows: Vec<McwWindow> = WINDOWS.iter().map(|&w| McwWindow::new(w)).collect();
    let mut scoreboard = [0u64; 4];
    let mut tally = PredictorTally::default();

    // Prime every window with the first 63 symbols.
    for pos in 1..=WINDOWS[0] {
        for w in windows.iter_mut() {
            w.advance(symbols, pos);
        }
    }

    for pos in WINDOWS[0]..l {
        // Ties on the scoreboard go to the smallest window.
        let mut winner = 0usize;
        for j in 1..4 {
            if scoreboard[j] > scoreboard[winner] {
                winner = j;
            }
        }
        let actual = symbols[pos];
        tally.record(windows[winner].predict() == actual);

        for (j, w) in windows.iter().enumerate() {
            if w.predict() == actual {
                scoreboard[j] += 1;
            }
        }
        for w in windows.iter_mut() {
            w.advance(symbols, pos + 1);
        }
    }

    predictor_entropy(&tally, TEST_NAME)
}
