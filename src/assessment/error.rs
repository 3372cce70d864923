//! Engine error surface.

use thiserror::Error;

/// Errors reported by the assessment engine.
///
/// Per-test inapplicability is not an error: a test that cannot run on
/// a given input is recorded as absent in the per-test breakdown and
/// excluded from the minimum. Only input validation failures and
/// non-converging numerical routines surface here.
#[derive(Debug, Clone, Error)]
pub enum AssessmentError {
    /// The input failed validation before any statistical work began.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A statistical computation could not complete.
    ///
    /// The offending sub-test is identified; no partial result is
    /// returned, since a silently degraded entropy estimate is a
    /// security-relevant correctness bug.
    #[error("assessment failed in {test}: {reason}")]
    AssessmentFailed {
        /// Name of the sub-test that failed.
        test: &'static str,
        /// Human-readable cause.
        reason: String,
    },
}
