//! Non-IID entropy estimator battery (SP800-90B §6.3).
//!
//! Ten independent estimators, each producing its own min-entropy
//! estimate over an immutable sample; the battery's output is the
//! minimum across all applicable estimates. Collision, Markov, and
//! compression estimates are defined for binary data only and run on
//! the bit expansion; the remaining seven also run on the original
//! symbol sequence when symbols carry more than one bit.

mod collision;
mod compression;
mod lag;
mod lz78y;
mod markov;
mod mcv;
mod multi_mcw;
mod multi_mmc;
mod prediction;
mod tuple;

use crate::assessment::{AssessmentError, TestResult};
use crate::sample::SampleSet;

pub(crate) use mcv::mcv_estimate;

/// Battery output for one assessment call.
pub(crate) struct BatteryOutcome {
    /// Minimum estimate over the symbol sequence, bits per symbol.
    /// Equals `h_bitstring` for one-bit symbols.
    pub h_original: f64,
    /// Minimum estimate over the bit expansion, bits per bit.
    pub h_bitstring: f64,
    /// Per-test breakdown in evaluation order, symbol domain first.
    pub results: Vec<TestResult>,
}

/// Test names, symbol domain.
const SYMBOL_NAMES: DomainNames = DomainNames {
    mcv: "most_common_value",
    collision: "collision",
    markov: "markov",
    compression: "compression",
    t_tuple: "t_tuple",
    lrs: "longest_repeated_substring",
    multi_mcw: "multi_mcw_prediction",
    lag: "lag_prediction",
    multi_mmc: "multi_mmc_prediction",
    lz78y: "lz78y_prediction",
};

/// Test names, bit-expansion domain (reported separately so the
/// breakdown stays auditable when both domains run).
const BIT_NAMES: DomainNames = DomainNames {
    mcv: "most_common_value (bitstring)",
    collision: "collision (bitstring)",
    markov: "markov (bitstring)",
    compression: "compression (bitstring)",
    t_tuple: "t_tuple (bitstring)",
    lrs: "longest_repeated_substring (bitstring)",
    multi_mcw: "multi_mcw_prediction (bitstring)",
    lag: "lag_prediction (bitstring)",
    multi_mmc: "multi_mmc_prediction (bitstring)",
    lz78y: "lz78y_prediction (bitstring)",
};

struct DomainNames {
    mcv: &'static str,
    collision: &'static str,
    markov: &'static str,
    compression: &'static str,
    t_tuple: &'static str,
    lrs: &'static str,
    multi_mcw: &'static str,
    lag: &'static str,
    multi_mmc: &'static str,
    lz78y: &'static str,
}

/// Runs the full battery on a sample.
pub(crate) fn run_battery(sample: &SampleSet) -> Result<BatteryOutcome, AssessmentError> {
    let bits = sample.bit_expansion();
    let mut results = Vec::new();

    let h_original = if sample.is_binary() {
        // One domain only; computed below on the expansion.
        None
    } else {
        let (h, mut symbol_results) = battery_on(sample.symbols(), &SYMBOL_NAMES, false)?;
        results.append(&mut symbol_results);
        Some(h)
    };

    let (h_bitstring, mut bit_results) = battery_on(&bits, &BIT_NAMES, true)?;
    results.append(&mut bit_results);

    let h_bitstring = h_bitstring.min(1.0);
    let h_original = h_original
        .unwrap_or(h_bitstring)
        .min(sample.bits_per_symbol() as f64);

    Ok(BatteryOutcome {
        h_original,
        h_bitstring,
        results,
    })
}

/// Runs the estimators applicable to one series. `binary_domain`
/// additionally enables the three binary-only estimators.
///
/// Returned minimum ranges over applicable estimates only; the fixed
/// evaluation order breaks exact ties in favor of the earlier test.
fn battery_on(
    series: &[u8],
    names: &DomainNames,
    binary_domain: bool,
) -> Result<(f64, Vec<TestResult>), AssessmentError> {
    let mut results = Vec::with_capacity(10);
    let mut min = f64::INFINITY;
    let record = |results: &mut Vec<TestResult>,
                      min: &mut f64,
                      name: &'static str,
                      estimate: Option<f64>| {
        match estimate {
            Some(h) => {
                let h = h.max(0.0);
                tracing::debug!(test = name, estimate = h, "estimator finished");
                if h < *min {
                    *min = h;
                }
                results.push(TestResult::with_estimate(name, h));
            }
            None => {
                tracing::debug!(test = name, "estimator not applicable");
                results.push(TestResult::not_applicable(name));
            }
        }
    };

    record(
        &mut results,
        &mut min,
        names.mcv,
        Some(mcv::mcv_estimate(series)),
    );

    if binary_domain {
        record(
            &mut results,
            &mut min,
            names.collision,
            collision::collision_estimate(series)?,
        );
        record(
            &mut results,
            &mut min,
            names.markov,
            markov::markov_estimate(series),
        );
        record(
            &mut results,
            &mut min,
            names.compression,
            compression::compression_estimate(series)?,
        );
    }

    let (t_tuple, lrs) = tuple::tuple_and_lrs_estimates(series);
    record(&mut results, &mut min, names.t_tuple, t_tuple);
    record(&mut results, &mut min, names.lrs, lrs);

    record(
        &mut results,
        &mut min,
        names.multi_mcw,
        multi_mcw::multi_mcw_estimate(series)?,
    );
    record(
        &mut results,
        &mut min,
        names.lag,
        lag::lag_estimate(series)?,
    );
    record(
        &mut results,
        &mut min,
        names.multi_mmc,
        multi_mmc::multi_mmc_estimate(series)?,
    );
    record(
        &mut results,
        &mut min,
        names.lz78y,
        lz78y::lz78y_estimate(series)?,
    );

    Ok((min, results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_on_constant_symbols_is_near_zero() {
        let sample = SampleSet::new(&[5u8; 2000], 8).unwrap();
        let outcome = run_battery(&sample).unwrap();
        assert!(outcome.h_original < 0.01, "h = {}", outcome.h_original);
        assert!(outcome.h_bitstring < 0.01);
    }

    #[test]
    fn test_binary_sample_reports_single_domain() {
        let data: Vec<u8> = (0..500).map(|i| (i % 2) as u8).collect();
        let sample = SampleSet::new(&data, 1).unwrap();
        let outcome = run_battery(&sample).unwrap();
        assert_eq!(outcome.results.len(), 10);
        assert_eq!(outcome.h_original, outcome.h_bitstring);
    }

    #[test]
    fn test_wide_sample_reports_both_domains() {
        let data: Vec<u8> = (0..500).map(|i| (i % 16) as u8).collect();
        let sample = SampleSet::new(&data, 4).unwrap();
        let outcome = run_battery(&sample).unwrap();
        // 7 symbol-domain results + 10 bit-domain results.
        assert_eq!(outcome.results.len(), 17);
        assert!(outcome.results.iter().any(|r| r.name == "markov (bitstring)"));
        assert!(!outcome.results.iter().any(|r| r.name == "markov"));
    }

    #[test]
    fn test_minimum_excludes_inapplicable_tests() {
        // Short sample: most predictors cannot run, but MCV can, so
        // the battery still yields a finite minimum.
        let sample = SampleSet::new(&[1, 2], 8).unwrap();
        let outcome = run_battery(&sample).unwrap();
        assert!(outcome.h_original.is_finite());
        assert!(outcome
            .results
            .iter()
            .any(|r| !r.applicable));
    }
}
