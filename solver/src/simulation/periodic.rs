//! Periodic broadcaster sampler: fixed interval, uniform jitter, loss.

use rand::rngs::SmallRng;
use rand::Rng;

use super::sampler::{check_horizon, survives, LatencySampler};
use crate::config::SamplerConfig;
use crate::error::{LatencyError, Result};

/// Draws the broadcaster phase uniformly in `0..adv_interval` and the scan
/// phase uniformly in `0..scan_interval`. Each event after the first is
/// delayed by `adv_interval + U{0..=max_adv_delay}`.
#[derive(Debug, Clone)]
pub struct PeriodicSampler {
    adv_interval: u64,
    config: SamplerConfig,
}

impl PeriodicSampler {
    pub fn new(adv_interval: u64, config: SamplerConfig) -> Result<Self> {
        if adv_interval == 0 {
            return Err(LatencyError::config("advertising interval must be positive"));
        }
        check_horizon(&config.scan)?;
        Ok(Self {
            adv_interval,
            config,
        })
    }

    pub fn adv_interval(&self) -> u64 {
        self.adv_interval
    }

    #[inline(always)]
    fn next_adv(&self, adv: u64, rng: &mut SmallRng) -> u64 {
        let mut next = adv + self.adv_interval;
        if self.config.max_adv_delay > 0 {
            next += rng.random_range(0..=self.config.max_adv_delay);
        }
        next
    }
}

impl LatencySampler for PeriodicSampler {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn identifier(&self) -> String {
        format!("A{}_{}", self.adv_interval, self.config.identifier())
    }

    fn simulate_once(&self, rng: &mut SmallRng) -> u64 {
        let scan = &self.config.scan;
        let end = scan.end_time;
        let fail = self.config.fail_rate.fraction();
        let timeout = self.timeout_latency();

        let mut adv = rng.random_range(0..self.adv_interval);
        if adv > end {
            return timeout;
        }
        let s = scan.scan_interval as i64;
        let w = scan.scan_window as i64;
        let mut down = s - rng.random_range(0..scan.scan_interval) as i64;

        while down - s < end as i64 {
            let up = down - w;
            while (adv as i64) < up {
                adv = self.next_adv(adv, rng);
                if adv > end {
                    return timeout;
                }
            }
            while (adv as i64) < down {
                if survives(rng, fail) {
                    return adv;
                }
                adv = self.next_adv(adv, rng);
                if adv > end {
                    return timeout;
                }
            }
            down += s;
        }
        timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LossRate, ScanParams};
    use rand::SeedableRng;

    fn sampler(loss: f64, delay: u64) -> PeriodicSampler {
        let cfg = SamplerConfig::new(
            ScanParams::new(5120, 512, 50_000).unwrap(),
            LossRate::from_fraction(loss).unwrap(),
            delay,
        );
        PeriodicSampler::new(1860, cfg).unwrap()
    }

    #[test]
    fn test_draws_within_range() {
        let s = sampler(0.3, 10);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..2000 {
            assert!(s.simulate_once(&mut rng) <= 50_001);
        }
    }

    #[test]
    fn test_draw_n_deterministic_and_rejects_zero() {
        let s = sampler(0.1, 10);
        assert_eq!(s.draw_n(500, 9).unwrap(), s.draw_n(500, 9).unwrap());
        assert!(s.draw_n(0, 9).is_err());
    }

    #[test]
    fn test_total_loss_times_out() {
        let s = sampler(1.0, 0);
        assert!(s.draw_n(100, 3).unwrap().iter().all(|&l| l == 50_001));
    }

    #[test]
    fn test_discover_rate() {
        let s = sampler(0.0, 0);
        assert_eq!(s.discover_rate(60_000, 10, 1).unwrap(), 1.0);
        // full scan cycle plus one interval always suffices without loss
        assert_eq!(s.discover_rate(50_000, 1000, 1).unwrap(), 1.0);
        assert!(s.discover_rate(100, 1000, 1).unwrap() < 0.2);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let cfg = SamplerConfig::new(ScanParams::new(5120, 512, 0).unwrap(), LossRate::ZERO, 0);
        assert!(matches!(
            PeriodicSampler::new(1860, cfg),
            Err(LatencyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_identifier() {
        assert_eq!(sampler(0.0, 10).identifier(), "A1860_W512_T5120_F0_R10_E50000");
    }
}
