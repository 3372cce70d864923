//! Test statistics for the permutation-based IID tests (SP800-90B
//! §5.1).
//!
//! Nineteen scalar statistics: excursion, directional runs (count,
//! length, increase/decrease balance), runs relative to the median
//! (count, length), collision averages and maxima, periodicity and
//! covariance at five lags, and a compression statistic. Each is
//! recomputed on every permutation, so they are kept allocation-light.

use std::collections::HashMap;

/// Lags used by the periodicity and covariance statistics.
pub(crate) const LAGS: [usize; 5] = [1, 2, 8, 16, 32];

/// Total number of scalar statistics.
pub(crate) const NUM_STATS: usize = 19;

/// Statistic names, index-aligned with [`compute_all`] output.
pub(crate) const STAT_NAMES: [&str; NUM_STATS] = [
    "excursion",
    "num_directional_runs",
    "len_directional_runs",
    "num_increases_decreases",
    "num_runs_median",
    "len_runs_median",
    "avg_collision",
    "max_collision",
    "periodicity_lag_1",
    "periodicity_lag_2",
    "periodicity_lag_8",
    "periodicity_lag_16",
    "periodicity_lag_32",
    "covariance_lag_1",
    "covariance_lag_2",
    "covariance_lag_8",
    "covariance_lag_16",
    "covariance_lag_32",
    "compression",
];

/// Per-sample context that is invariant under permutation: the median
/// of the symbol distribution and whether the sample is binary.
///
/// Binary samples are transformed per the standard before some
/// statistics: block popcounts (conversion I) for the value-ordering
/// statistics and block values (conversion II) for the collision
/// statistics, both over non-overlapping 8-bit blocks.
#[derive(Clone, Copy)]
pub(crate) struct StatContext {
    pub median: f64,
    pub binary: bool,
}

impl StatContext {
    pub(crate) fn for_sample(symbols: &[u8], binary: bool) -> Self {
        let median = if binary {
            0.5
        } else {
            let mut sorted = symbols.to_vec();
            sorted.sort_unstable();
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
            } else {
                sorted[mid] as f64
            }
        };
        Self { median, binary }
    }
}

/// Computes all 19 statistics for one arrangement of the sample.
pub(crate) fn compute_all(symbols: &[u8], ctx: &StatContext) -> [f64; NUM_STATS] {
    let mut out = [0.0; NUM_STATS];

    // Binary data goes through the block conversions; wider symbols
    // are used as-is.
    let converted = ctx
        .binary
        .then(|| (block_popcounts(symbols), block_values(symbols)));
    let (ordering, collision_seq): (&[u8], &[u8]) = match &converted {
        Some((popcounts, values)) => (popcounts, values),
        None => (symbols, symbols),
    };

    out[0] = excursion(ordering);

    let (num_runs, len_runs, max_updown) = directional_runs(ordering);
    out[1] = num_runs as f64;
    out[2] = len_runs as f64;
    out[3] = max_updown as f64;

    let (num_median, len_median) = median_runs(symbols, ctx.median);
    out[4] = num_median as f64;
    out[5] = len_median as f64;

    let (avg_coll, max_coll) = collisions(collision_seq);
    out[6] = avg_coll;
    out[7] = max_coll as f64;

    for (i, &lag) in LAGS.iter().enumerate() {
        out[8 + i] = periodicity(ordering, lag) as f64;
        out[13 + i] = covariance(ordering, lag);
    }

    out[18] = lz_phrase_count(symbols) as f64;

    out
}

fn block_popcounts(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|c| c.iter().map(|&b| b & 1).sum())
        .collect()
}

fn block_values(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|c| c.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

/// Maximum deviation of the running sum from its linear trend.
fn excursion(s: &[u8]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mean = s.iter().map(|&x| x as f64).sum::<f64>() / s.len() as f64;
    let mut running = 0.0;
    let mut max_dev: f64 = 0.0;
    for (i, &x) in s.iter().enumerate() {
        running += x as f64;
        max_dev = max_dev.max((running - (i + 1) as f64 * mean).abs());
    }
    max_dev
}

/// Number of directional runs, longest directional run, and the larger
/// of the increase/decrease counts. A tie (equal neighbors) counts as
/// an increase, matching the standard's `s_i ≤ s_{i+1}` convention.
fn directional_runs(s: &[u8]) -> (u64, u64, u64) {
    if s.len() < 2 {
        return (0, 0, 0);
    }
    let mut num_runs = 1u64;
    let mut len_run = 1u64;
    let mut max_len = 1u64;
    let mut increases = 0u64;
    let mut decreases = 0u64;
    let mut prev_up = s[1] >= s[0];
    if prev_up {
        increases += 1;
    } else {
        decreases += 1;
    }
    for w in s.windows(2).skip(1) {
        let up = w[1] >= w[0];
        if up {
            increases += 1;
        } else {
            decreases += 1;
        }
        if up == prev_up {
            len_run += 1;
        } else {
            num_runs += 1;
            len_run = 1;
            prev_up = up;
        }
        max_len = max_len.max(len_run);
    }
    (num_runs, max_len, increases.max(decreases))
}

/// Number and maximum length of runs of symbols on one side of the
/// median (values ≥ median count as the high side).
fn median_runs(s: &[u8], median: f64) -> (u64, u64) {
    if s.is_empty() {
        return (0, 0);
    }
    let side = |x: u8| x as f64 >= median;
    let mut num_runs = 1u64;
    let mut len_run = 1u64;
    let mut max_len = 1u64;
    let mut prev = side(s[0]);
    for &x in &s[1..] {
        let cur = side(x);
        if cur == prev {
            len_run += 1;
        } else {
            num_runs += 1;
            len_run = 1;
            prev = cur;
        }
        max_len = max_len.max(len_run);
    }
    (num_runs, max_len)
}

/// Average and maximum length of collision segments: each segment ends
/// at the first repeat of any value seen within it.
fn collisions(s: &[u8]) -> (f64, u64) {
    let mut seen = [false; 256];
    let mut lengths: Vec<u64> = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < s.len() {
        let v = s[i] as usize;
        if seen[v] {
            lengths.push((i - start + 1) as u64);
            seen = [false; 256];
            start = i + 1;
        } else {
            seen[v] = true;
        }
        i += 1;
    }
    if lengths.is_empty() {
        return (0.0, 0);
    }
    let sum: u64 = lengths.iter().sum();
    let max = lengths.iter().copied().max().unwrap_or(0);
    (sum as f64 / lengths.len() as f64, max)
}

/// Number of positions whose symbol recurs `lag` steps later.
fn periodicity(s: &[u8], lag: usize) -> u64 {
    if s.len() <= lag {
        return 0;
    }
    s.iter()
        .zip(&s[lag..])
        .filter(|(a, b)| a == b)
        .count() as u64
}

/// Sum of products of symbols `lag` apart.
fn covariance(s: &[u8], lag: usize) -> f64 {
    if s.len() <= lag {
        return 0.0;
    }
    s.iter()
        .zip(&s[lag..])
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum()
}

/// Number of phrases in a greedy LZ78 parse: a deterministic,
/// order-sensitive compressibility measure used as the compression
/// statistic.
fn lz_phrase_count(s: &[u8]) -> u64 {
    // Dictionary of phrase → id; phrases extend symbol by symbol.
    let mut dict: HashMap<(u64, u8), u64> = HashMap::new();
    let mut next_id = 1u64;
    let mut phrases = 0u64;
    let mut current = 0u64; // 0 = empty phrase
    for &x in s {
        if let Some(&id) = dict.get(&(current, x)) {
            current = id;
        } else {
            dict.insert((current, x), next_id);
            next_id += 1;
            phrases += 1;
            current = 0;
        }
    }
    if current != 0 {
        phrases += 1;
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excursion_of_constant_sequence_is_zero() {
        assert_eq!(excursion(&[5; 100]), 0.0);
    }

    #[test]
    fn test_excursion_of_sorted_sequence_is_large() {
        let data: Vec<u8> = (0..100).collect();
        assert!(excursion(&data) > 100.0);
    }

    #[test]
    fn test_directional_runs_on_monotone_sequence() {
        let data: Vec<u8> = (0..50).collect();
        let (num, len, updown) = directional_runs(&data);
        assert_eq!(num, 1);
        assert_eq!(len, 49);
        assert_eq!(updown, 49);
    }

    #[test]
    fn test_directional_runs_on_sawtooth() {
        // 0,1,0,1,...: every comparison flips direction.
        let data: Vec<u8> = (0..20).map(|i| (i % 2) as u8).collect();
        let (num, len, _) = directional_runs(&data);
        assert_eq!(num, 19);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_directional_runs_count_ties_as_increases() {
        // 5,5,5,3: two ties (up) then a drop, so two runs and two
        // increases versus one decrease.
        let (num, len, updown) = directional_runs(&[5, 5, 5, 3]);
        assert_eq!(num, 2);
        assert_eq!(len, 2);
        assert_eq!(updown, 2);
    }

    #[test]
    fn test_median_runs_split_by_median() {
        // Median of 0..10 repeated is 4.5; alternating blocks.
        let data = [0u8, 0, 9, 9, 9, 0];
        let (num, len) = median_runs(&data, 4.5);
        assert_eq!(num, 3);
        assert_eq!(len, 3);
    }

    #[test]
    fn test_collisions_on_constant_sequence() {
        let (avg, max) = collisions(&[1; 10]);
        assert_eq!(avg, 2.0);
        assert_eq!(max, 2);
    }

    #[test]
    fn test_periodicity_counts_lagged_repeats() {
        let data = [1u8, 2, 1, 2, 1, 2];
        assert_eq!(periodicity(&data, 2), 4);
        assert_eq!(periodicity(&data, 1), 0);
    }

    #[test]
    fn test_lz_phrase_count_orders_by_structure() {
        let repetitive = vec![0u8; 200];
        let varied: Vec<u8> = (0..200u32).map(|i| ((i * 37 + 11) % 251) as u8).collect();
        assert!(lz_phrase_count(&repetitive) < lz_phrase_count(&varied));
    }

    #[test]
    fn test_compute_all_yields_nineteen_statistics() {
        let data: Vec<u8> = (0..100).map(|i| ((i * 7) % 10) as u8).collect();
        let ctx = StatContext::for_sample(&data, false);
        let stats = compute_all(&data, &ctx);
        assert_eq!(stats.len(), NUM_STATS);
        assert!(stats.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_binary_conversions() {
        let bits = vec![1u8, 1, 1, 1, 0, 0, 0, 0, 1, 0, 1, 0];
        assert_eq!(block_popcounts(&bits), vec![4, 2]);
        assert_eq!(block_values(&bits), vec![0b11110000, 0b1010]);
    }
}
