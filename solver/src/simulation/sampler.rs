//! Shared sampler capability.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{SamplerConfig, ScanParams};
use crate::constants::timeout_index;
use crate::distribution::{LatencyDistribution, OutputForm};
use crate::error::{LatencyError, Result};

/// A randomized model of the same broadcaster/scanner pair an analytic
/// engine describes.
pub trait LatencySampler: Sync {
    fn config(&self) -> &SamplerConfig;

    /// One latency in `0..=end_time + 1`; `end_time + 1` means not
    /// discovered within the horizon.
    fn simulate_once(&self, rng: &mut SmallRng) -> u64;

    /// Label for experiment output.
    fn identifier(&self) -> String {
        self.config().identifier()
    }

    fn timeout_latency(&self) -> u64 {
        timeout_index(self.config().scan.end_time) as u64
    }

    /// `n` draws in parallel; draw `i` uses `SmallRng` seeded `seed + i`, so
    /// the output does not depend on the thread count.
    fn draw_n(&self, n: usize, seed: u64) -> Result<Vec<u64>> {
        if n == 0 {
            return Err(LatencyError::config(
                "invalid sample count: n must be larger than zero",
            ));
        }
        Ok((0..n)
            .into_par_iter()
            .map(|i| {
                let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
                self.simulate_once(&mut rng)
            })
            .collect())
    }

    /// Fraction of `n` draws discovered by `target_time`.
    fn discover_rate(&self, target_time: u64, n: usize, seed: u64) -> Result<f64> {
        if target_time > self.config().scan.end_time {
            tracing::warn!(
                target_time,
                end_time = self.config().scan.end_time,
                "target time beyond simulated horizon"
            );
            return Ok(1.0);
        }
        let draws = self.draw_n(n, seed)?;
        let hits = draws.iter().filter(|&&l| l <= target_time).count();
        Ok(hits as f64 / n as f64)
    }

    /// Empirical distribution of `n` draws.
    fn empirical(&self, n: usize, seed: u64, form: OutputForm) -> Result<LatencyDistribution> {
        let draws = self.draw_n(n, seed)?;
        LatencyDistribution::empirical(&draws, self.config().scan.end_time, form)
    }
}

/// Samplers draw event times up to the horizon, so it must be positive.
pub(crate) fn check_horizon(scan: &ScanParams) -> Result<()> {
    scan.validate()?;
    if scan.end_time == 0 {
        return Err(LatencyError::config("simulation end time must be positive"));
    }
    Ok(())
}

/// Whether one event survives loss.
#[inline(always)]
pub(crate) fn survives<R: Rng + ?Sized>(rng: &mut R, fail_rate: f64) -> bool {
    fail_rate == 0.0 || rng.random::<f64>() >= fail_rate
}
