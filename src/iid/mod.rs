//! IID test battery (SP800-90B §5).
//!
//! Decides whether a sample is plausibly IID, via permutation tests
//! over nineteen statistics plus two chi-square sanity checks, and
//! computes the most-common-value entropy estimate. The IID verdict is
//! reported, never enforced: a rejected hypothesis is a warning to the
//! caller, not a failed assessment.

mod chi_square;
mod permutation;
mod statistics;

use crate::assessment::{AssessmentError, TestResult};
use crate::noniid::mcv_estimate;
use crate::sample::SampleSet;

pub(crate) use chi_square::CHI_SQUARE_CUTOFF;

/// IID battery output for one assessment call.
pub(crate) struct IidOutcome {
    /// MCV estimate on the symbol sequence, bits per symbol.
    pub h_original: f64,
    /// MCV estimate on the bit expansion, bits per bit.
    pub h_bitstring: f64,
    /// Whether every statistic stayed consistent with IID sampling.
    pub iid_plausible: bool,
    /// Per-test breakdown: MCV estimates, permutation statistics with
    /// p-values, chi-square checks.
    pub results: Vec<TestResult>,
}

/// Knobs for the permutation test, threaded per call.
pub(crate) struct IidConfig {
    pub permutations: u32,
    pub seed: [u8; 32],
    pub workers: usize,
    pub verbosity: u8,
}

/// Runs the IID battery on a sample.
pub(crate) fn run_battery(
    sample: &SampleSet,
    config: &IidConfig,
) -> Result<IidOutcome, AssessmentError> {
    let mut results = Vec::new();

    // Entropy estimates: MCV on both domains.
    let h_bitstring = mcv_estimate(&sample.bit_expansion()).min(1.0);
    let h_original = if sample.is_binary() {
        results.push(TestResult::with_estimate("most_common_value", h_bitstring));
        h_bitstring
    } else {
        let h = mcv_estimate(sample.symbols()).min(sample.bits_per_symbol() as f64);
        results.push(TestResult::with_estimate("most_common_value", h));
        results.push(TestResult::with_estimate(
            "most_common_value (bitstring)",
            h_bitstring,
        ));
        h
    };

    // Permutation battery.
    let outcome = permutation::permutation_test(
        sample.symbols(),
        sample.is_binary(),
        config.permutations,
        config.seed,
        config.workers,
    );
    let mut iid_plausible = outcome.consistent;
    for (i, &name) in permutation::statistic_names().iter().enumerate() {
        let mut result = TestResult::with_p_value(name, outcome.p_values[i]);
        if config.verbosity >= 1 {
            result = result.detail(format!("observed={:.6}", outcome.observed[i]));
        }
        results.push(result);
    }

    // Chi-square sanity checks.
    for (name, check) in [
        (
            "chi_square_independence",
            chi_square::independence(sample.symbols()),
        ),
        (
            "chi_square_goodness_of_fit",
            chi_square::goodness_of_fit(sample.symbols()),
        ),
    ] {
        match check {
            Some((statistic, df, p)) => {
                if p < CHI_SQUARE_CUTOFF {
                    iid_plausible = false;
                }
                let mut result = TestResult::with_p_value(name, p);
                if config.verbosity >= 1 {
                    result = result.detail(format!("statistic={statistic:.4}, df={df}"));
                }
                results.push(result);
            }
            None => results.push(TestResult::not_applicable(name)),
        }
    }

    if !iid_plausible {
        tracing::warn!("sample is not consistent with the IID hypothesis");
    }

    Ok(IidOutcome {
        h_original,
        h_bitstring,
        iid_plausible,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IidConfig {
        IidConfig {
            permutations: 100,
            seed: [11u8; 32],
            workers: 2,
            verbosity: 0,
        }
    }

    #[test]
    fn test_battery_reports_all_tests() {
        let data: Vec<u8> = (0..600u32).map(|i| ((i * 131 + 17) % 256) as u8).collect();
        let sample = SampleSet::new(&data, 8).unwrap();
        let outcome = run_battery(&sample, &config()).unwrap();
        // 2 MCV + 19 permutation statistics + 2 chi-square.
        assert_eq!(outcome.results.len(), 23);
        assert!(outcome.h_original > 0.0);
    }

    #[test]
    fn test_trending_sample_is_implausible() {
        let data: Vec<u8> = (0..512u32).map(|i| (i / 2) as u8).collect();
        let sample = SampleSet::new(&data, 8).unwrap();
        let outcome = run_battery(&sample, &config()).unwrap();
        assert!(!outcome.iid_plausible);
    }

    #[test]
    fn test_verbosity_adds_detail() {
        let data: Vec<u8> = (0..200u32).map(|i| ((i * 131 + 17) % 256) as u8).collect();
        let sample = SampleSet::new(&data, 8).unwrap();
        let quiet = run_battery(&sample, &config()).unwrap();
        let mut verbose_config = config();
        verbose_config.verbosity = 1;
        let verbose = run_battery(&sample, &verbose_config).unwrap();
        assert!(quiet.results.iter().all(|r| r.detail.is_none()));
        assert!(verbose.results.iter().any(|r| r.detail.is_some()));
    }
}
