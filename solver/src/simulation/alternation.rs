//! Alternation broadcaster sampler.

use rand::rngs::SmallRng;
use rand::Rng;

use super::sampler::{check_horizon, survives, LatencySampler};
use crate::alternation::AlternationSequence;
use crate::config::{LossRate, SamplerConfig, ScanParams};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct AlternationSampler {
    sequence: AlternationSequence,
    config: SamplerConfig,
}

impl AlternationSampler {
    pub fn new(sequence: AlternationSequence, scan: ScanParams, fail_rate: LossRate) -> Result<Self> {
        check_horizon(&scan)?;
        Ok(Self {
            sequence,
            config: SamplerConfig::new(scan, fail_rate, 0),
        })
    }

    pub fn sequence(&self) -> &AlternationSequence {
        &self.sequence
    }
}

impl LatencySampler for AlternationSampler {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn identifier(&self) -> String {
        let scan = &self.config.scan;
        format!(
            "ABP_W{}_T{}_F{}_E{}",
            scan.scan_window,
            scan.scan_interval,
            self.config.fail_rate.percent().round() as u64,
            scan.end_time
        )
    }

    fn simulate_once(&self, rng: &mut SmallRng) -> u64 {
        let scan = &self.config.scan;
        let end = scan.end_time as i64;
        let fail = self.config.fail_rate.fraction();
        let timeout = self.timeout_latency();

        let mut sequence = self.sequence.clone();
        let (start, offset) = sequence.random_start(rng);
        sequence.set_start(start);

        let mut adv = offset as i64;
        let mut down = rng.random_range(0..scan.scan_interval) as i64;
        let mut up = down - scan.scan_window as i64;

        while up <= end {
            while up > adv {
                adv += sequence.advance() as i64;
            }
            if adv > end {
                return timeout;
            }
            while adv < down && adv <= end {
                if survives(rng, fail) {
                    return adv as u64;
                }
                adv += sequence.advance() as i64;
            }
            down += scan.scan_interval as i64;
            up = down - scan.scan_window as i64;
        }
        timeout
    }
}
