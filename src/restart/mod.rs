//! Restart consistency test (SP800-90B §3.1.4).
//!
//! Restart data reorganizes the noise source's output into rows of
//! equal length, one row per independent restart. The main-sequence
//! estimate is validated two ways: a binomial sanity check on the most
//! frequent symbol within any row or column, and a re-assessment of
//! the row-major and column-major datasets. Inconsistency lowers the
//! final bound and records a warning; it never fails the assessment.

use crate::assessment::AssessmentError;
use crate::noniid;
use crate::sample::SampleSet;

/// Restart samples: a rows × columns matrix of symbols, one row per
/// restart of the noise source.
pub struct RestartData {
    symbols: Vec<u8>,
    bits_per_symbol: u8,
    rows: usize,
    columns: usize,
}

impl RestartData {
    /// Builds restart data from a row-major byte buffer.
    ///
    /// Fails with [`AssessmentError::InvalidInput`] if the buffer does
    /// not hold exactly `rows × columns` symbols, either dimension is
    /// below 2, or the bit width is out of range.
    pub fn new(
        data: &[u8],
        bits_per_symbol: u8,
        rows: usize,
        columns: usize,
    ) -> Result<Self, AssessmentError> {
        if rows < 2 || columns < 2 {
            return Err(AssessmentError::InvalidInput(format!(
                "restart matrix must be at least 2x2, got {rows}x{columns}"
            )));
        }
        if data.len() != rows * columns {
            return Err(AssessmentError::InvalidInput(format!(
                "restart data holds {} symbols, expected {rows}x{columns} = {}",
                data.len(),
                rows * columns
            )));
        }
        // Reuse SampleSet validation for bit width and masking.
        let sample = SampleSet::new(data, bits_per_symbol)?;
        Ok(Self {
            symbols: sample.symbols().to_vec(),
            bits_per_symbol,
            rows,
            columns,
        })
    }

    /// Number of restart rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Symbols per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    fn row_major(&self) -> &[u8] {
        &self.symbols
    }

    fn column_major(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.symbols.len());
        for c in 0..self.columns {
            for r in 0..self.rows {
                out.push(self.symbols[r * self.columns + c]);
            }
        }
        out
    }

    /// Most frequent symbol count within any single row and within any
    /// single column.
    fn max_counts(&self) -> (u64, u64) {
        let mut max_row = 0u64;
        for r in 0..self.rows {
            let mut counts = [0u64; 256];
            for c in 0..self.columns {
                counts[self.symbols[r * self.columns + c] as usize] += 1;
            }
            max_row = max_row.max(counts.iter().copied().max().unwrap_or(0));
        }
        let mut max_col = 0u64;
        for c in 0..self.columns {
            let mut counts = [0u64; 256];
            for r in 0..self.rows {
                counts[self.symbols[r * self.columns + c] as usize] += 1;
            }
            max_col = max_col.max(counts.iter().copied().max().unwrap_or(0));
        }
        (max_row, max_col)
    }
}

impl std::fmt::Debug for RestartData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestartData")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("bits_per_symbol", &self.bits_per_symbol)
            .finish()
    }
}

/// Result of the restart validation.
pub struct RestartOutcome {
    /// Non-IID minimum over the row-major dataset, bits per symbol.
    pub h_row: f64,
    /// Non-IID minimum over the column-major dataset, bits per symbol.
    pub h_column: f64,
    /// Whether the binomial sanity check passed.
    pub sanity_passed: bool,
    /// Informational findings to surface in the assessment.
    pub warnings: Vec<String>,
}

/// Validates a main-sequence estimate `h_main` against restart data.
pub(crate) fn run_restart(
    data: &RestartData,
    h_main: f64,
) -> Result<RestartOutcome, AssessmentError> {
    let mut warnings = Vec::new();

    // Sanity check: under the claimed entropy, the most probable
    // symbol has probability at most 2^(-h_main); the top count in a
    // row or column should not be wildly improbable under a binomial
    // with that probability.
    let p = 2.0f64.powf(-h_main).clamp(0.0, 1.0);
    let alpha = 0.01 / (data.rows + data.columns) as f64;
    let (max_row, max_col) = data.max_counts();
    let row_tail = crate::numeric::binomial_upper_tail(max_row, data.columns as u64, p);
    let col_tail = crate::numeric::binomial_upper_tail(max_col, data.rows as u64, p);
    let sanity_passed = row_tail >= alpha && col_tail >= alpha;
    if !sanity_passed {
        warnings.push(format!(
            "restart sanity check failed: max row count {max_row} (P = {row_tail:.3e}), \
             max column count {max_col} (P = {col_tail:.3e}), alpha = {alpha:.3e}"
        ));
        tracing::warn!(max_row, max_col, "restart sanity check failed");
    }

    // Re-assess row-major and column-major datasets.
    let row_sample = SampleSet::new(data.row_major(), data.bits_per_symbol)?;
    let row_outcome = noniid::run_battery(&row_sample)?;
    let h_row = row_outcome
        .h_original
        .min(data.bits_per_symbol as f64 * row_outcome.h_bitstring);

    let column_sample = SampleSet::new(&data.column_major(), data.bits_per_symbol)?;
    let column_outcome = noniid::run_battery(&column_sample)?;
    let h_column = column_outcome
        .h_original
        .min(data.bits_per_symbol as f64 * column_outcome.h_bitstring);

    if h_row.min(h_column) < h_main / 2.0 {
        warnings.push(format!(
            "restart estimates (row {h_row:.4}, column {h_column:.4}) are inconsistent \
             with the main-sequence estimate {h_main:.4}"
        ));
        tracing::warn!(h_row, h_column, h_main, "restart estimates inconsistent");
    }

    Ok(RestartOutcome {
        h_row,
        h_column,
        sanity_passed,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_dimensions() {
        let err = RestartData::new(&[1, 2, 3], 8, 2, 2).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidInput(_)));

        let err = RestartData::new(&[1, 2], 8, 1, 2).unwrap_err();
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_column_major_transposes() {
        let data = RestartData::new(&[1, 2, 3, 4, 5, 6], 8, 2, 3).unwrap();
        assert_eq!(data.column_major(), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_max_counts() {
        // Rows: [1,1,2], [3,3,3]; columns: [1,3], [1,3], [2,3].
        let data = RestartData::new(&[1, 1, 2, 3, 3, 3], 8, 2, 3).unwrap();
        let (max_row, max_col) = data.max_counts();
        assert_eq!(max_row, 3);
        assert_eq!(max_col, 1);
    }

    #[test]
    fn test_consistent_restart_data_passes() {
        // Varied rows against a modest main estimate.
        let mut x = 0x1234_5678u32;
        let raw: Vec<u8> = (0..1024)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x >> 24) as u8
            })
            .collect();
        let data = RestartData::new(&raw, 8, 32, 32).unwrap();
        let outcome = run_restart(&data, 1.0).unwrap();
        assert!(outcome.sanity_passed);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_degenerate_restart_rows_warn() {
        // Constant matrix against a high main estimate: the top count
        // equals the row length, vanishingly improbable at h = 7.
        let raw = vec![42u8; 1024];
        let data = RestartData::new(&raw, 8, 32, 32).unwrap();
        let outcome = run_restart(&data, 7.0).unwrap();
        assert!(!outcome.sanity_passed);
        assert!(!outcome.warnings.is_empty());
        assert!(outcome.h_row < 0.5);
    }
}
