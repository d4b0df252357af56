//! Coverage-based latency engines.
//!
//! One pass fixes the broadcaster's phase (first event at t = 0) and walks
//! events in increasing time. For each event the scan-phase footprint is
//! claimed against the coverage structure; the newly claimed mass is the
//! probability that this event is the first one the receiver hears. The
//! pass stops at the horizon or when nothing is left to claim, and whatever
//! is unclaimed becomes timeout mass.
//!
//! The broadcaster's phase is then marginalized: the per-pass result is
//! spread uniformly over every offset of the first event (`0..adv_interval`,
//! or `0..seq[i]` for an alternation pass starting at index `i`).

use super::{Footprint, LatencyEngine, LatencyMass};
use crate::accumulator::GeometricLossAccumulator;
use crate::alternation::AlternationSequence;
use crate::config::{LossRate, ScanParams};
use crate::coverage::probabilistic::LossyCoverage;
use crate::coverage::{CoverageModel, IntervalCoverage, ProbabilisticIntervalCoverage};
use crate::distribution::{LatencyDistribution, LatencyHistogram, OutputForm};
use crate::error::{LatencyError, Result};
use crate::logging::RunLog;

/// Claim footprints of `events` until the horizon or exhaustion.
fn cover_pass<C, I>(coverage: &mut C, events: I, scan: &ScanParams, log: &RunLog) -> Result<LatencyMass>
where
    C: CoverageModel,
    I: IntoIterator<Item = u64>,
{
    log.verbose(format_args!("coverage start"));
    let mut mass = LatencyMass::default();
    for t in events {
        if t > scan.end_time {
            break;
        }
        let claimed = coverage.claim(Footprint::of(t, scan).parts())?;
        if claimed > 0.0 {
            mass.entries.push((t, claimed));
        }
        coverage.remaining(log)?;
        if coverage.exhausted() {
            log.verbose(format_args!("no segment left after t={t}"));
            break;
        }
    }
    mass.timeout = coverage.remaining(log)?;
    log.verbose(format_args!("coverage complete"));
    Ok(mass)
}

/// Event times `0, g1, g1 + g2, ..` following an alternation sequence.
struct AlternationEvents<'a> {
    sequence: &'a mut AlternationSequence,
    next: u64,
}

impl Iterator for AlternationEvents<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let t = self.next;
        self.next = t.checked_add(self.sequence.advance())?;
        Some(t)
    }
}

fn alternation_events(sequence: &mut AlternationSequence, start: usize) -> AlternationEvents<'_> {
    sequence.set_start(start);
    AlternationEvents { sequence, next: 0 }
}

/// Periodic broadcaster, no loss, no jitter.
#[derive(Debug, Clone)]
pub struct FixedIntervalEngine {
    adv_interval: u64,
    scan: ScanParams,
    log: RunLog,
}

impl FixedIntervalEngine {
    pub fn new(adv_interval: u64, scan: ScanParams, log: RunLog) -> Result<Self> {
        if adv_interval == 0 {
            return Err(LatencyError::config("advertising interval must be positive"));
        }
        scan.validate()?;
        Ok(Self {
            adv_interval,
            scan,
            log,
        })
    }

    /// Latency mass with the first event at t = 0.
    pub fn try_cover(&self) -> Result<LatencyMass> {
        let mut coverage = IntervalCoverage::over(self.scan.scan_interval);
        let events = (0..=self.scan.end_time).step_by(self.adv_interval as usize);
        cover_pass(&mut coverage, events, &self.scan, &self.log)
    }
}

impl LatencyEngine for FixedIntervalEngine {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn simulate_all(&self, form: OutputForm) -> Result<LatencyDistribution> {
        let base = self.try_cover()?;
        let hist = base
            .to_histogram(self.scan.end_time)
            .spread_uniform(self.adv_interval);
        self.log.verbose(format_args!("calculation complete"));
        hist.into_distribution(form)
    }
}

/// Alternation broadcaster, no loss.
#[derive(Debug, Clone)]
pub struct AlternationEngine {
    sequence: AlternationSequence,
    scan: ScanParams,
    log: RunLog,
}

impl AlternationEngine {
    pub fn new(sequence: AlternationSequence, scan: ScanParams, log: RunLog) -> Result<Self> {
        scan.validate()?;
        Ok(Self {
            sequence,
            scan,
            log,
        })
    }

    /// Latency mass for a pass whose first event closes interval `start`.
    pub fn try_cover(&self, start: usize) -> Result<LatencyMass> {
        let mut sequence = self.sequence.clone();
        let mut coverage = IntervalCoverage::over(self.scan.scan_interval);
        let events = alternation_events(&mut sequence, start);
        cover_pass(&mut coverage, events, &self.scan, &self.log)
    }
}

impl LatencyEngine for AlternationEngine {
    fn name(&self) -> &'static str {
        "alternation"
    }

    fn simulate_all(&self, form: OutputForm) -> Result<LatencyDistribution> {
        let mut hist = LatencyHistogram::new(self.scan.end_time);
        for (i, &len) in self.sequence.lengths().iter().enumerate() {
            let base = self.try_cover(i)?;
            hist.accumulate(&base.to_histogram(self.scan.end_time).spread_uniform(len));
        }
        self.log.verbose(format_args!("calculation complete"));
        hist.into_distribution(form)
    }
}

/// Alternation broadcaster where every event is independently lost with a
/// fixed probability.
#[derive(Debug, Clone)]
pub struct LossyAlternationEngine {
    sequence: AlternationSequence,
    scan: ScanParams,
    loss: LossRate,
    log: RunLog,
}

impl LossyAlternationEngine {
    pub fn new(
        sequence: AlternationSequence,
        scan: ScanParams,
        loss: LossRate,
        log: RunLog,
    ) -> Result<Self> {
        scan.validate()?;
        Ok(Self {
            sequence,
            scan,
            loss,
            log,
        })
    }

    /// Periodic broadcaster with loss: a one-element alternation sequence.
    pub fn periodic(adv_interval: u64, scan: ScanParams, loss: LossRate, log: RunLog) -> Result<Self> {
        Self::new(AlternationSequence::new(vec![adv_interval])?, scan, loss, log)
    }

    pub fn try_cover(&self, start: usize) -> Result<LatencyMass> {
        let mut sequence = self.sequence.clone();
        let events = alternation_events(&mut sequence, start);
        let success = self.loss.success();

        if success == 0.0 {
            return Ok(LatencyMass {
                entries: Vec::new(),
                timeout: 1.0,
            });
        }
        if self.scan.scan_window == self.scan.scan_interval {
            return self.always_listening(events, success);
        }

        let mut coverage = LossyCoverage {
            inner: ProbabilisticIntervalCoverage::over(self.scan.scan_interval),
            success,
        };
        cover_pass(&mut coverage, events, &self.scan, &self.log)
    }

    /// Receiver always listening: every footprint is the whole domain, so the
    /// first heard event index is geometric in the per-event success rate.
    fn always_listening(&self, events: AlternationEvents<'_>, success: f64) -> Result<LatencyMass> {
        let mut geometric = GeometricLossAccumulator::new(success)?;
        let mut mass = LatencyMass::default();
        let mut last = None;
        for (k, t) in events.take_while(|&t| t <= self.scan.end_time).enumerate() {
            mass.entries.push((t, geometric.probability_at(k)));
            last = Some(k);
        }
        mass.timeout = match last {
            Some(k) => geometric.survival_at(k),
            None => 1.0,
        };
        Ok(mass)
    }
}

impl LatencyEngine for LossyAlternationEngine {
    fn name(&self) -> &'static str {
        "lossy"
    }

    fn simulate_all(&self, form: OutputForm) -> Result<LatencyDistribution> {
        let mut hist = LatencyHistogram::new(self.scan.end_time);
        for (i, &len) in self.sequence.lengths().iter().enumerate() {
            let base = self.try_cover(i)?;
            hist.accumulate(&base.to_histogram(self.scan.end_time).spread_uniform(len));
        }
        self.log.verbose(format_args!("calculation complete"));
        hist.into_distribution(form)
    }
}
