//! Numeric constants shared by the engines.
//!
//! Latencies are integer time units (the same unit as every interval
//! parameter). A distribution over a horizon `end_time` has
//! `end_time + 2` bins: `0..=end_time` for discoveries and
//! [`timeout_index`]`(end_time)` for "not discovered within horizon".

/// Offset of the timeout bucket past the inclusive horizon.
pub const TIMEOUT_NOTIFIER: u64 = 1;

/// Densities below this are snapped to zero by
/// [`ConvolutionAccumulator::attenuate_at`](crate::accumulator::ConvolutionAccumulator::attenuate_at).
pub const ATTENUATION_SNAP: f64 = 1e-5;

/// Tolerance on coverage measures before a negative remainder counts as a
/// fault (boolean coverage) or is clamped (probabilistic coverage).
pub const COVERAGE_EPSILON: f64 = 1e-9;

/// Default jitter bound used by the periodic sampler when none is given.
pub const DEFAULT_MAX_ADV_DELAY: u64 = 10;

/// Default number of sampler draws for cross-validation.
pub const DEFAULT_SAMPLE_COUNT: usize = 10_000;

/// Percentiles reported by the driver summary.
pub const SUMMARY_PERCENTILES: [u32; 5] = [10, 25, 50, 90, 99];

/// Index of the timeout bucket for a horizon.
#[inline(always)]
pub fn timeout_index(end_time: u64) -> usize {
    (end_time + TIMEOUT_NOTIFIER) as usize
}

/// Number of bins in a dense latency array for a horizon.
#[inline(always)]
pub fn histogram_len(end_time: u64) -> usize {
    timeout_index(end_time) + 1
}
