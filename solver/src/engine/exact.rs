//! Exact latency under bounded uniform jitter and independent loss.
//!
//! Every broadcast event after the nominal schedule is delayed by an
//! independent uniform draw from `0..=max_adv_delay`, so event `k` sits at
//! `first + (k - 1) * adv_interval + J_k` where `J_k` is a sum of `k` draws.
//! [`ConvolutionAccumulator`] layer `k` is exactly that compound-jitter
//! distribution.
//!
//! [`ExactJitterLossEngine::simulate_once`] fixes both phases and walks scan
//! windows in increasing time. Inside a window, each jitter value that puts
//! the current event in the window is heard with probability
//! `density * (1 - loss)`; the heard mass is removed from (or, under loss,
//! attenuated in) the accumulator so a later window cannot count it again,
//! and later layers are grown from the residual.
//!
//! [`ExactJitterLossEngine::simulate_all`] covers every scan phase within
//! one advertising interval with a base pass, reuses precomputed passes for
//! the phases that are translations of earlier ones (phase-difference
//! projection), then spreads the result over the remaining scan-phase
//! offset.

use super::{LatencyEngine, LatencyMass};
use crate::accumulator::ConvolutionAccumulator;
use crate::config::{LossRate, ScanParams};
use crate::distribution::{LatencyDistribution, LatencyHistogram, OutputForm};
use crate::error::{LatencyError, Result};
use crate::logging::RunLog;

#[derive(Debug, Clone)]
pub struct ExactJitterLossEngine {
    adv_interval: u64,
    scan: ScanParams,
    loss: LossRate,
    max_adv_delay: u64,
    log: RunLog,
}

impl ExactJitterLossEngine {
    pub fn new(
        adv_interval: u64,
        scan: ScanParams,
        loss: LossRate,
        max_adv_delay: u64,
        log: RunLog,
    ) -> Result<Self> {
        if adv_interval == 0 {
            return Err(LatencyError::config("advertising interval must be positive"));
        }
        scan.validate()?;
        Ok(Self {
            adv_interval,
            scan,
            loss,
            max_adv_delay,
            log,
        })
    }

    /// Only `scan_interval > adv_interval > scan_window` is handled; other
    /// regimes are refused rather than approximated.
    pub fn check_supported(&self) -> Result<()> {
        if self.scan.scan_interval <= self.adv_interval {
            return Err(LatencyError::unsupported(format!(
                "advertising interval {} must be shorter than scan interval {}",
                self.adv_interval, self.scan.scan_interval
            )));
        }
        if self.adv_interval <= self.scan.scan_window {
            return Err(LatencyError::unsupported(format!(
                "advertising interval {} must exceed scan window {}",
                self.adv_interval, self.scan.scan_window
            )));
        }
        Ok(())
    }

    /// One pass with the first nominal event at `first_adv_ts` and the first
    /// scan window closing at `first_scan_down_ts` (may be negative).
    pub fn simulate_once(&self, first_adv_ts: i64, first_scan_down_ts: i64) -> LatencyMass {
        let a = self.adv_interval as i64;
        let s = self.scan.scan_interval as i64;
        let w = self.scan.scan_window as i64;
        let d = self.max_adv_delay as i64;
        let end = self.scan.end_time as i64;
        let success = self.loss.success();

        let mut jitter = ConvolutionAccumulator::new(self.max_adv_delay as usize);
        let mut event = jitter.extend();
        let mut adv_base = first_adv_ts;
        let mut delay_range = d;
        let mut scan_up = first_scan_down_ts - w;
        let mut remaining = 1.0f64;
        let mut mass = LatencyMass::default();

        while scan_up <= end {
            // skip events whose every jittered position precedes this window
            while adv_base + delay_range < scan_up {
                adv_base += a;
                delay_range += d;
                event = jitter.extend();
            }
            let scan_down = scan_up + w;
            if adv_base < scan_down {
                let lo = adv_base.max(scan_up);
                let hi = (adv_base + delay_range + 1).min(scan_down).min(end + 1);
                for ts in lo..hi {
                    let delay = (ts - adv_base) as usize;
                    if jitter.value_at(event, delay) <= 0.0 {
                        continue;
                    }
                    let heard = jitter.density_at(event, delay) * success;
                    if self.loss.is_lossless() {
                        jitter.zero_at(event, delay);
                    } else {
                        jitter.attenuate_at(event, delay, self.loss.fraction());
                    }
                    remaining -= heard;
                    mass.entries.push((ts as u64, heard));
                }
            }
            scan_up += s;
        }

        if remaining > 0.0 {
            mass.timeout = remaining;
        }
        mass
    }

    /// Full histogram before normalization.
    pub fn histogram(&self) -> Result<LatencyHistogram> {
        self.check_supported()?;
        let a = self.adv_interval;
        let d = self.max_adv_delay;
        let projections = self.scan.scan_interval / a;
        let remain_cases = self.scan.scan_interval % a;

        let mut jitter = ConvolutionAccumulator::new(d as usize);
        let delay_pdfs: Vec<Vec<f64>> = (0..=projections as usize).map(|k| jitter.pdf(k)).collect();

        // passes whose scan phase sits `delta` before the first event
        let by_delta: Vec<LatencyMass> = (0..=d * projections)
            .map(|delta| {
                if delta == 0 {
                    LatencyMass::default()
                } else {
                    self.simulate_once(0, -(delta as i64))
                }
            })
            .collect();
        self.log.verbose(format_args!(
            "{} phase-difference passes precomputed",
            by_delta.len().saturating_sub(1)
        ));

        let mut hist = LatencyHistogram::new(self.scan.end_time);
        for first_down in 0..a {
            let base = self.simulate_once(0, first_down as i64);
            base.add_to(&mut hist, 0, 1.0);

            let times = if first_down < remain_cases {
                projections + 1
            } else {
                projections
            };
            for proj in 1..times {
                let base_adv = proj * a;
                let range = proj * d;
                let delay_pdf = &delay_pdfs[proj as usize];

                for adv_delay in first_down + 1..=range {
                    let p = delay_pdf[adv_delay as usize];
                    if p > 0.0 {
                        let delta = adv_delay - first_down;
                        by_delta[delta as usize].add_to(&mut hist, adv_delay + base_adv, p);
                    }
                }
                for adv_delay in 0..=range.min(first_down) {
                    let p = delay_pdf[adv_delay as usize];
                    if p > 0.0 {
                        base.add_to(&mut hist, adv_delay + base_adv, p);
                    }
                }
            }
        }
        self.log.verbose(format_args!("phase projection complete"));

        Ok(hist.spread_uniform(a))
    }
}

impl LatencyEngine for ExactJitterLossEngine {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn simulate_all(&self, form: OutputForm) -> Result<LatencyDistribution> {
        let hist = self.histogram()?;
        self.log.verbose(format_args!("calculation complete"));
        hist.into_distribution(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(a: u64, s: u64, w: u64, end: u64, loss: f64, delay: u64) -> ExactJitterLossEngine {
        ExactJitterLossEngine::new(
            a,
            ScanParams::new(s, w, end).unwrap(),
            LossRate::from_fraction(loss).unwrap(),
            delay,
            RunLog::quiet(),
        )
        .unwrap()
    }

    #[test]
    fn test_regime_checks() {
        let err = engine(600, 500, 50, 5000, 0.0, 0).simulate_all(OutputForm::Pdf);
        assert!(matches!(err, Err(LatencyError::Unsupported { .. })));
        let err = engine(40, 500, 50, 5000, 0.0, 0).simulate_all(OutputForm::Pdf);
        assert!(matches!(err, Err(LatencyError::Unsupported { .. })));
        let err = engine(500, 500, 50, 5000, 0.0, 0).simulate_all(OutputForm::Pdf);
        assert!(matches!(err, Err(LatencyError::Unsupported { .. })));
    }

    #[test]
    fn test_single_pass_conserves_mass() {
        let e = engine(70, 200, 30, 3000, 0.25, 6);
        for first_down in [0i64, 13, 69, -5] {
            let once = e.simulate_once(0, first_down);
            assert!((once.total() - 1.0).abs() < 1e-9, "first_down={first_down}");
            assert!(once.entries.iter().all(|&(_, m)| m >= 0.0));
        }
    }

    #[test]
    fn test_jitter_free_pass_is_deterministic_hit() {
        // windows [20, 50), [220, 250), [420, 450); events every 70 from 0
        let e = engine(70, 200, 30, 1000, 0.0, 0);
        let once = e.simulate_once(0, 50);
        assert_eq!(once.entries, vec![(420, 1.0)]);
        assert_eq!(once.timeout, 0.0);
    }

    #[test]
    fn test_lossy_pass_hears_later_events() {
        let e = engine(70, 200, 30, 1000, 0.5, 0);
        let once = e.simulate_once(0, 50);
        assert_eq!(once.entries[0], (420, 0.5));
        assert!(once.entries.len() > 1);
        assert!((once.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_normalized_and_deterministic() {
        let e = engine(70, 200, 30, 3000, 0.2, 4);
        let a = e.simulate_all(OutputForm::Pdf).unwrap();
        let b = e.simulate_all(OutputForm::Pdf).unwrap();
        assert_eq!(a, b);
        let total: f64 = a.values().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        let cdf = e.simulate_all(OutputForm::Cdf).unwrap();
        assert_eq!(*cdf.values().last().unwrap(), 1.0);
        assert!(cdf.values().windows(2).all(|w| w[0] <= w[1] + 1e-15));
    }

    #[test]
    fn test_loss_delays_discovery() {
        let clean = engine(70, 200, 30, 3000, 0.0, 0)
            .simulate_all(OutputForm::Pdf)
            .unwrap();
        let lossy = engine(70, 200, 30, 3000, 0.5, 0)
            .simulate_all(OutputForm::Pdf)
            .unwrap();
        assert!(lossy.mean_discovered().unwrap() > clean.mean_discovered().unwrap());
    }
}
