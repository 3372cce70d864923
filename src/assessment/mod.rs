//! Assessment orchestration.
//!
//! Validates input, drives the selected test battery over an immutable
//! [`SampleSet`](crate::sample::SampleSet), applies the standard's
//! conservative bounding rules, and assembles the final result record.
//! Engine invocations are stateless: every call builds and discards
//! its own working structures, and diagnostic verbosity is a per-call
//! option rather than process state.

mod error;
mod result;

pub use error::AssessmentError;
pub use result::{AssessmentResult, TestResult, TestType};

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::iid::{self, IidConfig};
use crate::noniid;
use crate::restart::{self, RestartData};
use crate::sample::SampleSet;

/// Per-call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOptions {
    /// Diagnostic detail level: 0 is silent, higher levels add detail
    /// strings to the per-test breakdown.
    pub verbosity: u8,
    /// Number of permutations for the IID test (the standard uses
    /// 10,000).
    pub permutation_count: u32,
    /// Seed for permutation generation. `None` draws one from the OS;
    /// set a fixed seed for reproducible runs.
    pub permutation_seed: Option<[u8; 32]>,
    /// Worker threads for the permutation test; 0 means one per
    /// available core. Results do not depend on this value.
    pub workers: usize,
}

impl Default for AssessmentOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            permutation_count: 10_000,
            permutation_seed: None,
            workers: 0,
        }
    }
}

/// Entropy assessment engine.
///
/// Stateless across calls; the options struct is the only
/// configuration and it is read-only during assessment.
#[derive(Debug, Clone, Default)]
pub struct Assessment {
    options: AssessmentOptions,
}

impl Assessment {
    /// Creates an engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with explicit options.
    pub fn with_options(options: AssessmentOptions) -> Self {
        Self { options }
    }

    /// Runs the IID test suite (SP800-90B §5).
    ///
    /// The returned `min_entropy` is the most-common-value bound; the
    /// permutation and chi-square verdict is reported through
    /// `iid_plausible` and `warnings` without failing the call.
    pub fn assess_iid(
        &self,
        data: &[u8],
        bits_per_symbol: u8,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sample = self.validated_sample(data, bits_per_symbol)?;
        tracing::debug!(
            len = sample.len(),
            bits = bits_per_symbol,
            "starting IID assessment"
        );

        let config = IidConfig {
            permutations: self.options.permutation_count,
            seed: self.seed(),
            workers: self.worker_count(),
            verbosity: self.options.verbosity,
        };
        let outcome = iid::run_battery(&sample, &config)?;

        let min_entropy = outcome
            .h_original
            .min(bits_per_symbol as f64 * outcome.h_bitstring)
            .clamp(0.0, bits_per_symbol as f64);

        let mut warnings = Vec::new();
        if !outcome.iid_plausible {
            warnings.push("sample is not consistent with the IID hypothesis".to_string());
        }

        Ok(AssessmentResult {
            test_type: TestType::Iid,
            min_entropy,
            h_original: outcome.h_original,
            h_bitstring: outcome.h_bitstring,
            per_test: outcome.results,
            data_size: sample.len(),
            bits_per_symbol,
            iid_plausible: Some(outcome.iid_plausible),
            warnings,
        })
    }

    /// Runs the non-IID estimator battery (SP800-90B §6.3).
    pub fn assess_non_iid(
        &self,
        data: &[u8],
        bits_per_symbol: u8,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sample = self.validated_sample(data, bits_per_symbol)?;
        tracing::debug!(
            len = sample.len(),
            bits = bits_per_symbol,
            "starting non-IID assessment"
        );

        let outcome = noniid::run_battery(&sample)?;
        Ok(self.assemble_non_iid(&sample, outcome))
    }

    /// Runs the non-IID battery and validates the result against
    /// restart samples (SP800-90B §3.1.4).
    ///
    /// Restart inconsistency lowers `min_entropy` to the worst of the
    /// main, row, and column estimates and records a warning; it does
    /// not fail the assessment.
    pub fn assess_non_iid_with_restart(
        &self,
        data: &[u8],
        bits_per_symbol: u8,
        restart_data: &RestartData,
    ) -> Result<AssessmentResult, AssessmentError> {
        let sample = self.validated_sample(data, bits_per_symbol)?;
        let outcome = noniid::run_battery(&sample)?;
        let mut result = self.assemble_non_iid(&sample, outcome);

        let restart = restart::run_restart(restart_data, result.min_entropy)?;
        result.min_entropy = result
            .min_entropy
            .min(restart.h_row)
            .min(restart.h_column)
            .clamp(0.0, bits_per_symbol as f64);
        result.warnings.extend(restart.warnings);
        Ok(result)
    }

    fn assemble_non_iid(
        &self,
        sample: &SampleSet,
        outcome: noniid::BatteryOutcome,
    ) -> AssessmentResult {
        let bits = sample.bits_per_symbol();
        let min_entropy = outcome
            .h_original
            .min(bits as f64 * outcome.h_bitstring)
            .clamp(0.0, bits as f64);
        AssessmentResult {
            test_type: TestType::NonIid,
            min_entropy,
            h_original: outcome.h_original,
            h_bitstring: outcome.h_bitstring,
            per_test: outcome.results,
            data_size: sample.len(),
            bits_per_symbol: bits,
            iid_plausible: None,
            warnings: Vec::new(),
        }
    }

    /// Fail-fast validation: no statistical work happens on bad input.
    fn validated_sample(
        &self,
        data: &[u8],
        bits_per_symbol: u8,
    ) -> Result<SampleSet, AssessmentError> {
        let sample = SampleSet::new(data, bits_per_symbol)?;
        if sample.len() < 2 {
            return Err(AssessmentError::InvalidInput(
                "data must hold at least 2 symbols".to_string(),
            ));
        }
        Ok(sample)
    }

    fn seed(&self) -> [u8; 32] {
        self.options.permutation_seed.unwrap_or_else(|| {
            let mut seed = [0u8; 32];
            OsRng.fill_bytes(&mut seed);
            seed
        })
    }

    fn worker_count(&self) -> usize {
        if self.options.workers > 0 {
            self.options.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Assessment {
        Assessment::with_options(AssessmentOptions {
            verbosity: 0,
            permutation_count: 100,
            permutation_seed: Some([42u8; 32]),
            workers: 2,
        })
    }

    #[test]
    fn test_empty_data_fails_fast() {
        for result in [engine().assess_iid(&[], 8), engine().assess_non_iid(&[], 8)] {
            let err = result.unwrap_err();
            assert!(matches!(err, AssessmentError::InvalidInput(_)));
            assert!(err.to_string().contains("empty"));
        }
    }

    #[test]
    fn test_out_of_range_bit_width_fails_fast() {
        let data = [1u8, 2, 3, 4];
        for bits in [0u8, 9] {
            let err = engine().assess_iid(&data, bits).unwrap_err();
            assert!(err.to_string().contains("bits_per_symbol"));
            let err = engine().assess_non_iid(&data, bits).unwrap_err();
            assert!(err.to_string().contains("bits_per_symbol"));
        }
    }

    #[test]
    fn test_single_symbol_fails_fast() {
        let err = engine().assess_non_iid(&[7], 8).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidInput(_)));
    }

    #[test]
    fn test_two_symbols_still_produce_a_result() {
        let result = engine().assess_non_iid(&[1, 2], 8).unwrap();
        assert!(result.min_entropy >= 0.0);
        assert!(result.per_test.iter().any(|t| !t.applicable));
    }

    #[test]
    fn test_four_byte_non_iid_reference_is_reproducible() {
        let a = engine().assess_non_iid(&[1, 2, 3, 4], 8).unwrap();
        let b = engine().assess_non_iid(&[1, 2, 3, 4], 8).unwrap();
        assert_eq!(a.min_entropy, b.min_entropy);
        assert_eq!(a.data_size, 4);
        assert_eq!(a.test_type, TestType::NonIid);
        // Golden value: 27 of the 32 expansion bits are zero, so the
        // bitstring MCV upper bound saturates at p_u = 1 and the
        // binding estimate is exactly zero.
        assert_eq!(a.min_entropy, 0.0);
        assert_eq!(a.h_bitstring, 0.0);
    }

    #[test]
    fn test_iid_assessment_is_idempotent_with_fixed_seed() {
        let data: Vec<u8> = (0..300u32).map(|i| ((i * 131 + 17) % 256) as u8).collect();
        let a = engine().assess_iid(&data, 8).unwrap();
        let b = engine().assess_iid(&data, 8).unwrap();
        assert_eq!(a.min_entropy, b.min_entropy);
        let p_a: Vec<_> = a.per_test.iter().map(|t| t.p_value).collect();
        let p_b: Vec<_> = b.per_test.iter().map(|t| t.p_value).collect();
        assert_eq!(p_a, p_b);
    }

    #[test]
    fn test_constant_sample_has_near_zero_entropy() {
        let result = engine().assess_non_iid(&[9u8; 2000], 8).unwrap();
        assert!(result.min_entropy < 0.01, "h = {}", result.min_entropy);
    }

    #[test]
    fn test_restart_inconsistency_warns_and_lowers_bound() {
        // Varied main sequence, constant restart matrix.
        let mut x = 0x9e37_79b9u32;
        let main: Vec<u8> = (0..2048)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x >> 24) as u8
            })
            .collect();
        let restart_data = RestartData::new(&vec![5u8; 256], 8, 16, 16).unwrap();
        let result = engine()
            .assess_non_iid_with_restart(&main, 8, &restart_data)
            .unwrap();
        assert!(!result.warnings.is_empty());
        assert!(result.min_entropy < 0.01);
    }
}
