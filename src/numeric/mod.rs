//! Shared numerical routines.
//!
//! Small, allocation-free helpers used across the test batteries:
//! bounded bisection for the closed-form inversions, the regularized
//! incomplete gamma function for chi-square p-values, and exact
//! binomial tail probabilities for the restart sanity check.

use crate::assessment::AssessmentError;

/// One-sided 99% confidence coefficient (SP800-90B §6.3.1).
pub(crate) const Z_99: f64 = 2.576;

/// Maximum bisection iterations before the solver gives up.
pub(crate) const BISECT_MAX_ITER: u32 = 128;

/// Convergence tolerance for bisection solvers.
pub(crate) const BISECT_TOL: f64 = 1e-9;

/// Upper 99% confidence bound on a binomial proportion.
///
/// Converts an observed frequency into a conservative probability
/// bound: `min(1, p̂ + 2.576·sqrt(p̂(1−p̂)/(n−1)))`.
pub(crate) fn proportion_upper_bound(p_hat: f64, n: usize) -> f64 {
    debug_assert!(n >= 2);
    let nf = n as f64;
    (p_hat + Z_99 * (p_hat * (1.0 - p_hat) / (nf - 1.0)).sqrt()).min(1.0)
}

/// Solves `f(x) = target` on `[lo, hi]` for a monotone `f` by bisection.
///
/// The orientation of `f` is detected from its endpoint values. If the
/// target lies outside the range of `f` over the interval, the nearer
/// endpoint is returned. Exceeding the iteration cap is a hard failure:
/// a silently truncated root would skew the entropy bound.
pub(crate) fn bisect<F>(
    f: F,
    target: f64,
    mut lo: f64,
    mut hi: f64,
    test: &'static str,
) -> Result<f64, AssessmentError>
where
    F: Fn(f64) -> f64,
{
    let f_lo = f(lo);
    let f_hi = f(hi);
    let increasing = f_hi >= f_lo;

    // Target outside the attainable range: clamp to the nearer endpoint.
    if increasing {
        if target <= f_lo {
            return Ok(lo);
        }
        if target >= f_hi {
            return Ok(hi);
        }
    } else {
        if target >= f_lo {
            return Ok(lo);
        }
        if target <= f_hi {
            return Ok(hi);
        }
    }

    let mut iterations = 0;
    while hi - lo > BISECT_TOL {
        if iterations >= BISECT_MAX_ITER {
            return Err(AssessmentError::AssessmentFailed {
                test,
                reason: format!(
                    "bisection did not converge within {BISECT_MAX_ITER} iterations \
                     (interval [{lo:.12}, {hi:.12}])"
                ),
            });
        }
        let mid = 0.5 * (lo + hi);
        let val = f(mid);
        if !val.is_finite() {
            return Err(AssessmentError::AssessmentFailed {
                test,
                reason: format!("bisection objective not finite at {mid:.12}"),
            });
        }
        if (val < target) == increasing {
            lo = mid;
        } else {
            hi = mid;
        }
        iterations += 1;
    }
    Ok(0.5 * (lo + hi))
}

/// Natural log of the gamma function (Lanczos approximation).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    // g = 7, n = 9 Lanczos coefficients.
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection formula.
        return std::f64::consts::PI.ln() - (std::f64::consts::PI * x).sin().ln()
            - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Regularized upper incomplete gamma function Q(a, x).
///
/// Series expansion for x < a + 1, continued fraction otherwise
/// (Numerical Recipes style). Used for chi-square survival p-values:
/// `p = Q(df/2, statistic/2)`.
pub(crate) fn gamma_q(a: f64, x: f64) -> f64 {
    debug_assert!(a > 0.0 && x >= 0.0);
    if x == 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_cont_frac(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut term = sum;
    for _ in 0..500 {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * 1e-15 {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_cont_frac(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..500 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-15 {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Exact binomial upper tail P(X ≥ k) for X ~ Bin(n, p).
///
/// Evaluated with a log-space starting term and a stable term-ratio
/// recurrence, so it stays accurate deep in the tail where the restart
/// sanity check operates.
pub(crate) fn binomial_upper_tail(k: u64, n: u64, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n || p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    let q = 1.0 - p;
    let (kf, nf) = (k as f64, n as f64);
    let ln_term = ln_gamma(nf + 1.0) - ln_gamma(kf + 1.0) - ln_gamma(nf - kf + 1.0)
        + kf * p.ln()
        + (nf - kf) * q.ln();
    let mut term = ln_term.exp();
    let mut sum = term;
    let mut i = k;
    while i < n {
        term *= ((n - i) as f64 / (i + 1) as f64) * (p / q);
        sum += term;
        if term < sum * 1e-15 {
            break;
        }
        i += 1;
    }
    sum.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bisect_finds_root_of_monotone_function() {
        // 2 + 2p(1-p) on [0.5, 1] is strictly decreasing.
        let f = |p: f64| 2.0 + 2.0 * p * (1.0 - p);
        let p = bisect(f, 2.25, 0.5, 1.0, "test").unwrap();
        // Closed form: p = 0.5 + sqrt(1.25 - X/2)
        let expected = 0.5 + (1.25f64 - 2.25 / 2.0).sqrt();
        assert!((p - expected).abs() < 1e-8);
    }

    #[test]
    fn test_bisect_clamps_out_of_range_target() {
        let f = |p: f64| 2.0 + 2.0 * p * (1.0 - p);
        assert_eq!(bisect(f, 3.0, 0.5, 1.0, "test").unwrap(), 0.5);
        assert_eq!(bisect(f, 1.0, 0.5, 1.0, "test").unwrap(), 1.0);
    }

    #[test]
    fn test_ln_gamma_matches_factorials() {
        // Γ(n) = (n-1)!
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(11.0) - 3_628_800.0f64.ln()).abs() < 1e-9);
        // Γ(1/2) = sqrt(pi)
        assert!((ln_gamma(0.5) - 0.5 * std::f64::consts::PI.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_gamma_q_known_chi_square_quantiles() {
        // χ²(df=1): P(X ≥ 3.841) ≈ 0.05
        assert!((gamma_q(0.5, 3.841 / 2.0) - 0.05).abs() < 1e-4);
        // χ²(df=10): P(X ≥ 18.307) ≈ 0.05
        assert!((gamma_q(5.0, 18.307 / 2.0) - 0.05).abs() < 1e-4);
        // χ²(df=4): P(X ≥ 13.277) ≈ 0.01
        assert!((gamma_q(2.0, 13.277 / 2.0) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_binomial_tail_small_cases() {
        // X ~ Bin(3, 0.5): P(X ≥ 2) = 4/8 = 0.5
        assert!((binomial_upper_tail(2, 3, 0.5) - 0.5).abs() < 1e-12);
        // P(X ≥ 0) = 1, P(X ≥ 4) = 0
        assert_eq!(binomial_upper_tail(0, 3, 0.5), 1.0);
        assert_eq!(binomial_upper_tail(4, 3, 0.5), 0.0);
        // X ~ Bin(10, 0.1): P(X ≥ 1) = 1 - 0.9^10
        let expected = 1.0 - 0.9f64.powi(10);
        assert!((binomial_upper_tail(1, 10, 0.1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_proportion_bound_is_conservative_and_capped() {
        let p = proportion_upper_bound(0.5, 1000);
        assert!(p > 0.5 && p < 0.55);
        assert_eq!(proportion_upper_bound(1.0, 100), 1.0);
    }
}
