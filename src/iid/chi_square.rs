//! Chi-square sanity tests for the IID path (SP800-90B §5.2).
//!
//! Two order-sensitive checks that complement the permutation tests:
//! independence of adjacent non-overlapping symbol pairs, and
//! goodness-of-fit of per-segment symbol frequencies against the
//! whole-sample distribution. Each yields a p-value; values below
//! 0.001 are inconsistent with the IID hypothesis.

use crate::numeric::gamma_q;

/// Significance level from the standard.
pub(crate) const CHI_SQUARE_CUTOFF: f64 = 0.001;

/// Cells with expected counts below this are pooled.
const MIN_EXPECTED: f64 = 5.0;

/// Number of segments for the goodness-of-fit test.
const SEGMENTS: usize = 10;

/// Chi-square independence test on adjacent non-overlapping pairs.
///
/// Returns `(statistic, degrees of freedom, p-value)`, or `None` when
/// the input is too short or too concentrated to form at least two
/// usable cells.
pub(crate) fn independence(symbols: &[u8]) -> Option<(f64, u64, f64)> {
    let pairs = symbols.len() / 2;
    if pairs < 2 {
        return None;
    }

    let mut freq = [0.0f64; 256];
    for &s in symbols {
        freq[s as usize] += 1.0;
    }
    let lf = symbols.len() as f64;
    for f in freq.iter_mut() {
        *f /= lf;
    }

    let mut observed = vec![0.0f64; 65536];
    for chunk in symbols.chunks_exact(2) {
        observed[(chunk[0] as usize) << 8 | chunk[1] as usize] += 1.0;
    }

    // Pool cells whose expectation is too small for the chi-square
    // approximation to hold.
    let distinct = freq.iter().filter(|&&f| f > 0.0).count();
    let mut statistic = 0.0;
    let mut cells = 0u64;
    let mut pooled_obs = 0.0;
    let mut pooled_exp = 0.0;
    for a in 0..256 {
        if freq[a] == 0.0 {
            continue;
        }
        for b in 0..256 {
            if freq[b] == 0.0 {
                continue;
            }
            let expected = freq[a] * freq[b] * pairs as f64;
            let obs = observed[a << 8 | b];
            if expected < MIN_EXPECTED {
                pooled_obs += obs;
                pooled_exp += expected;
            } else {
                statistic += (obs - expected).powi(2) / expected;
                cells += 1;
            }
        }
    }
    if pooled_exp >= MIN_EXPECTED {
        statistic += (pooled_obs - pooled_exp).powi(2) / pooled_exp;
        cells += 1;
    }

    // Pair-cell count minus the marginal frequencies estimated from
    // the data, minus one for the total.
    let df = cells.checked_sub(distinct as u64)?;
    if df == 0 || cells < 2 {
        return None;
    }
    let p = gamma_q(df as f64 / 2.0, statistic / 2.0);
    Some((statistic, df, p))
}

/// Chi-square goodness-of-fit of symbol counts across ten equal
/// segments against the whole-sample frequencies.
pub(crate) fn goodness_of_fit(symbols: &[u8]) -> Option<(f64, u64, f64)> {
    let seg_len = symbols.len() / SEGMENTS;
    if seg_len == 0 {
        return None;
    }

    let mut totals = [0u64; 256];
    // Only the SEGMENTS × seg_len prefix participates, as in the
    // standard; a short tail is ignored.
    for &s in &symbols[..seg_len * SEGMENTS] {
        totals[s as usize] += 1;
    }

    // Symbols expected at least MIN_EXPECTED times per segment keep
    // their own cell; the rest pool into one.
    let keep: Vec<usize> = (0..256)
        .filter(|&v| totals[v] as f64 / SEGMENTS as f64 >= MIN_EXPECTED)
        .collect();
    let pooled_total: u64 = (0..256)
        .filter(|v| !keep.contains(v))
        .map(|v| totals[v])
        .sum();
    let pooled = pooled_total as f64 / SEGMENTS as f64 >= MIN_EXPECTED;
    let bins = keep.len() + usize::from(pooled);
    if bins < 2 {
        return None;
    }

    let mut statistic = 0.0;
    for seg in 0..SEGMENTS {
        let slice = &symbols[seg * seg_len..(seg + 1) * seg_len];
        let mut counts = [0u64; 256];
        for &s in slice {
            counts[s as usize] += 1;
        }
        for &v in &keep {
            let expected = totals[v] as f64 / SEGMENTS as f64;
            statistic += (counts[v] as f64 - expected).powi(2) / expected;
        }
        if pooled {
            let obs: u64 = (0..256).filter(|v| !keep.contains(v)).map(|v| counts[v]).sum();
            let expected = pooled_total as f64 / SEGMENTS as f64;
            statistic += (obs as f64 - expected).powi(2) / expected;
        }
    }

    let df = ((bins - 1) * (SEGMENTS - 1)) as u64;
    let p = gamma_q(df as f64 / 2.0, statistic / 2.0);
    Some((statistic, df, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_input_is_not_applicable() {
        assert!(independence(&[1, 2]).is_none());
        assert!(goodness_of_fit(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_uniform_cycling_data_passes_goodness_of_fit() {
        // Symbol counts identical in every segment.
        let data: Vec<u8> = (0..4000).map(|i| (i % 4) as u8).collect();
        let (stat, _, p) = goodness_of_fit(&data).unwrap();
        assert!(stat < 1e-9);
        assert!(p > 0.999);
    }

    #[test]
    fn test_drifting_distribution_fails_goodness_of_fit() {
        // First half all zeros, second half all ones: segment counts
        // deviate maximally from the pooled frequencies.
        let mut data = vec![0u8; 2000];
        data.extend(vec![1u8; 2000]);
        let (_, _, p) = goodness_of_fit(&data).unwrap();
        assert!(p < CHI_SQUARE_CUTOFF);
    }

    #[test]
    fn test_strictly_alternating_pairs_fail_independence() {
        // Pairs are always (0,1): under independence (0,0) and (1,1)
        // should appear equally often.
        let data: Vec<u8> = (0..2000).map(|i| (i % 2) as u8).collect();
        let (_, _, p) = independence(&data).unwrap();
        assert!(p < CHI_SQUARE_CUTOFF);
    }

    #[test]
    fn test_uniform_pair_coverage_passes_independence() {
        // Every (a, b) pair over a 4-symbol alphabet appears equally
        // often, matching the product of the marginals exactly.
        let mut data = Vec::new();
        for _ in 0..200 {
            for a in 0..4u8 {
                for b in 0..4u8 {
                    data.push(a);
                    data.push(b);
                }
            }
        }
        let (stat, _, p) = independence(&data).unwrap();
        assert!(stat < 1e-9, "stat = {stat}");
        assert!(p > 0.999, "p = {p}");
    }
}
