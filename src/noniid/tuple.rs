//! t-Tuple and Longest Repeated Substring estimates (SP800-90B §6.3.5,
//! §6.3.6).
//!
//! Both scan the sample for repeated tuples, so they share one suffix
//! array + LCP pass. The t-tuple estimate bounds entropy by the most
//! frequent tuple of every length observed at least 35 times; the LRS
//! estimate extends past that cutoff using pair-collision counts, up
//! to the longest substring that repeats at all.

use crate::numeric::proportion_upper_bound;

/// Minimum occurrence count for a tuple frequency to be considered
/// reliable (SP800-90B §6.3.5).
const TUPLE_CUTOFF: u64 = 35;

/// Computes the t-tuple and LRS estimates, in that order.
///
/// `None` entries mean the respective test is not applicable: no
/// symbol reaches the occurrence cutoff (t-tuple), or no substring
/// longer than t repeats (LRS).
pub(crate) fn tuple_and_lrs_estimates(symbols: &[u8]) -> (Option<f64>, Option<f64>) {
    let l = symbols.len();
    if l < 2 {
        return (None, None);
    }
    let sa = suffix_array(symbols);
    let lcp = lcp_array(symbols, &sa);
    let longest_repeat = lcp.iter().copied().max().unwrap_or(0);

    // t-tuple: largest t with Q(t) ≥ 35; P_max estimates per length.
    let mut t = 0usize;
    let mut p_hat = 0.0f64;
    for i in 1..=l {
        let (q, _) = runs_at_least(&lcp, i);
        if q < TUPLE_CUTOFF {
            break;
        }
        t = i;
        let p_i = q as f64 / (l - i + 1) as f64;
        p_hat = p_hat.max(p_i.powf(1.0 / i as f64));
    }
    let t_tuple = (t > 0).then(|| -proportion_upper_bound(p_hat, l).log2());

    // LRS: lengths t+1 ..= longest repeat, via pair-collision counts.
    let u = t + 1;
    let lrs = if longest_repeat >= u {
        let mut p_hat = 0.0f64;
        for i in u..=longest_repeat {
            let (_, pairs) = runs_at_least(&lcp, i);
            let positions = (l - i + 1) as f64;
            let total_pairs = positions * (positions - 1.0) / 2.0;
            p_hat = p_hat.max((pairs / total_pairs).powf(1.0 / i as f64));
        }
        Some(-proportion_upper_bound(p_hat, l).log2())
    } else {
        None
    };

    (t_tuple, lrs)
}

/// For tuple length `i`: the occurrence count of the most frequent
/// i-tuple, and the total number of position pairs holding equal
/// i-tuples.
///
/// A maximal run of m consecutive LCP entries ≥ i corresponds to m+1
/// suffixes sharing an i-prefix: one tuple occurring m+1 times.
fn runs_at_least(lcp: &[usize], i: usize) -> (u64, f64) {
    let mut best = 1u64;
    let mut pairs = 0.0;
    let mut run = 0u64;
    for &x in lcp {
        if x >= i {
            run += 1;
        } else if run > 0 {
            let m = run + 1;
            best = best.max(m);
            pairs += m as f64 * (m as f64 - 1.0) / 2.0;
            run = 0;
        }
    }
    if run > 0 {
        let m = run + 1;
        best = best.max(m);
        pairs += m as f64 * (m as f64 - 1.0) / 2.0;
    }
    (best, pairs)
}

/// Suffix array by prefix doubling. O(n log² n), insensitive to
/// degenerate (constant or periodic) inputs.
fn suffix_array(s: &[u8]) -> Vec<usize> {
    let n = s.len();
    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = s.iter().map(|&b| b as usize).collect();
    let mut next_rank = vec![0usize; n];
    let mut k = 1usize;
    loop {
        let key = |i: usize| {
            (
                rank[i],
                if i + k < n { rank[i + k] + 1 } else { 0 },
            )
        };
        sa.sort_unstable_by_key(|&i| key(i));
        next_rank[sa[0]] = 0;
        for j in 1..n {
            next_rank[sa[j]] =
                next_rank[sa[j - 1]] + usize::from(key(sa[j]) != key(sa[j - 1]));
        }
        rank.copy_from_slice(&next_rank);
        if rank[sa[n - 1]] == n - 1 {
            break;
        }
        k <<= 1;
    }
    sa
}

/// LCP array via Kasai's algorithm. `lcp[r]` is the longest common
/// prefix of suffixes `sa[r-1]` and `sa[r]`; `lcp[0] = 0`.
fn lcp_array(s: &[u8], sa: &[usize]) -> Vec<usize> {
    let n = s.len();
    let mut inv = vec![0usize; n];
    for (r, &i) in sa.iter().enumerate() {
        inv[i] = r;
    }
    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if inv[i] > 0 {
            let j = sa[inv[i] - 1];
            while i + h < n && j + h < n && s[i + h] == s[j + h] {
                h += 1;
            }
            lcp[inv[i]] = h;
            h = h.saturating_sub(1);
        } else {
            h = 0;
        }
    }
    lcp
}
