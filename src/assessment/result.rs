//! Assessment result types.
//!
//! These are the report-facing structures: serializable, created once
//! per assessment call, immutable, and owned by the caller after return.

use serde::Serialize;

/// Which test suite produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestType {
    /// Permutation-based IID test suite (SP800-90B §5).
    Iid,
    /// Non-IID estimator battery (SP800-90B §6.3).
    NonIid,
}

/// One sub-test's contribution to the assessment.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Test name, stable across runs.
    pub name: &'static str,
    /// Min-entropy estimate in bits per symbol, absent if the test
    /// produces no estimate (diagnostic-only tests) or could not run.
    pub estimate: Option<f64>,
    /// p-value, for tests that compute one.
    pub p_value: Option<f64>,
    /// False if the test could not run on this input (too short,
    /// degenerate alphabet). Inapplicable tests are excluded from the
    /// overall minimum.
    pub applicable: bool,
    /// Extra diagnostic detail, populated at verbosity ≥ 1.
    pub detail: Option<String>,
}

impl TestResult {
    /// An applicable test that produced an entropy estimate.
    pub(crate) fn with_estimate(name: &'static str, estimate: f64) -> Self {
        Self {
            name,
            estimate: Some(estimate),
            p_value: None,
            applicable: true,
            detail: None,
        }
    }

    /// An applicable diagnostic test that produced a p-value only.
    pub(crate) fn with_p_value(name: &'static str, p_value: f64) -> Self {
        Self {
            name,
            estimate: None,
            p_value: Some(p_value),
            applicable: true,
            detail: None,
        }
    }

    /// A test that could not run on this input.
    pub(crate) fn not_applicable(name: &'static str) -> Self {
        Self {
            name,
            estimate: None,
            p_value: None,
            applicable: false,
            detail: None,
        }
    }

    pub(crate) fn detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Final output of an assessment call.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    /// Which suite ran.
    pub test_type: TestType,
    /// The binding result: minimum over all applicable sub-test
    /// estimates, in bits per symbol.
    pub min_entropy: f64,
    /// Minimum over the estimates computed on the original symbol
    /// sequence, bits per symbol.
    pub h_original: f64,
    /// Minimum over the estimates computed on the binary expansion,
    /// bits per bit.
    pub h_bitstring: f64,
    /// Ordered per-test breakdown, for auditability.
    pub per_test: Vec<TestResult>,
    /// Number of symbols assessed.
    pub data_size: usize,
    /// Significant bits per symbol.
    pub bits_per_symbol: u8,
    /// IID path only: whether every permutation-test statistic and
    /// chi-square check was consistent with the IID hypothesis. This
    /// is reported, not enforced; the caller interprets it.
    pub iid_plausible: Option<bool>,
    /// Informational findings (restart inconsistency, IID rejection).
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_constructors() {
        let r = TestResult::with_estimate("most_common_value", 3.5);
        assert!(r.applicable);
        assert_eq!(r.estimate, Some(3.5));
        assert!(r.p_value.is_none());

        let r = TestResult::not_applicable("compression");
        assert!(!r.applicable);
        assert!(r.estimate.is_none());

        let r = TestResult::with_p_value("chi_square_independence", 0.42).detail("df=9".into());
        assert_eq!(r.p_value, Some(0.42));
        assert_eq!(r.detail.as_deref(), Some("df=9"));
    }
}
