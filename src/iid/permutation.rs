//! Permutation testing for the IID hypothesis (SP800-90B §5.1).
//!
//! The observed value of each statistic is ranked against the same
//! statistic recomputed on shuffled copies of the sample. Shuffling is
//! driven by per-permutation ChaCha20 streams derived from one seed,
//! so a run is reproducible for a given seed regardless of how many
//! worker threads share the load.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use super::statistics::{compute_all, StatContext, NUM_STATS, STAT_NAMES};

/// Both one-sided tail fractions must stay at or above this cutoff for
/// the sample to remain consistent with the IID hypothesis.
const TAIL_CUTOFF: f64 = 0.0001;

/// Tail counters for one statistic.
#[derive(Debug, Default, Clone, Copy)]
struct TailCounts {
    greater: u64,
    equal: u64,
    less: u64,
}

impl TailCounts {
    fn add(&mut self, permuted: f64, observed: f64) {
        if permuted > observed {
            self.greater += 1;
        } else if permuted == observed {
            self.equal += 1;
        } else {
            self.less += 1;
        }
    }

    fn merge(&mut self, other: &TailCounts) {
        self.greater += other.greater;
        self.equal += other.equal;
        self.less += other.less;
    }
}

/// Outcome of the permutation test battery.
pub(crate) struct PermutationOutcome {
    /// Observed statistic values, index-aligned with `STAT_NAMES`.
    pub observed: [f64; NUM_STATS],
    /// Per-statistic p-value: the smaller one-sided tail fraction,
    /// counting exact ties into both tails.
    pub p_values: [f64; NUM_STATS],
    /// True if no statistic fell in an extreme tail.
    pub consistent: bool,
}

/// Names of the permutation statistics, for report assembly.
pub(crate) fn statistic_names() -> &'static [&'static str; NUM_STATS] {
    &STAT_NAMES
}

/// Runs the permutation test with `permutations` shuffles across
/// `workers` threads.
pub(crate) fn permutation_test(
    symbols: &[u8],
    binary: bool,
    permutations: u32,
    seed: [u8; 32],
    workers: usize,
) -> PermutationOutcome {
    let ctx = StatContext::for_sample(symbols, binary);
    let observed = compute_all(symbols, &ctx);

    let workers = workers.max(1);
    let chunk = permutations.div_ceil(workers as u32);
    let mut tallies = [TailCounts::default(); NUM_STATS];

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for w in 0..workers {
            let start = (w as u32) * chunk;
            let end = permutations.min(start + chunk);
            if start >= end {
                break;
            }
            let ctx = ctx;
            handles.push(scope.spawn(move || {
                let mut local = [TailCounts::default(); NUM_STATS];
                let mut buf = symbols.to_vec();
                for perm in start..end {
                    let mut rng = ChaCha20Rng::from_seed(seed);
                    // Stream 0 is reserved; each permutation owns one.
                    rng.set_stream(1 + u64::from(perm));
                    buf.copy_from_slice(symbols);
                    shuffle(&mut buf, &mut rng);
                    let stats = compute_all(&buf, &ctx);
                    for (tally, (&stat, &obs)) in local
                        .iter_mut()
                        .zip(stats.iter().zip(observed.iter()))
                    {
                        tally.add(stat, obs);
                    }
                }
                local
            }));
        }
        for handle in handles {
            let local = match handle.join() {
                Ok(local) => local,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            for (tally, other) in tallies.iter_mut().zip(local.iter()) {
                tally.merge(other);
            }
        }
    });

    let n = permutations as f64;
    let mut p_values = [0.0; NUM_STATS];
    let mut consistent = true;
    for (i, tally) in tallies.iter().enumerate() {
        let high = (tally.greater + tally.equal) as f64 / n;
        let low = (tally.less + tally.equal) as f64 / n;
        let p = high.min(low);
        p_values[i] = p;
        if p < TAIL_CUTOFF {
            tracing::debug!(
                statistic = STAT_NAMES[i],
                p_value = p,
                "permutation statistic in extreme tail"
            );
            consistent = false;
        }
    }

    PermutationOutcome {
        observed,
        p_values,
        consistent,
    }
}

/// Fisher–Yates shuffle with rejection sampling, so the permutation
/// distribution is exactly uniform.
fn shuffle(buf: &mut [u8], rng: &mut ChaCha20Rng) {
    for i in (1..buf.len()).rev() {
        let j = gen_below(rng, (i + 1) as u32) as usize;
        buf.swap(i, j);
    }
}

fn gen_below(rng: &mut ChaCha20Rng, bound: u32) -> u32 {
    let zone = u32::MAX - u32::MAX % bound;
    loop {
        let v = rng.next_u32();
        if v < zone {
            return v % bound;
        }
    }
}
