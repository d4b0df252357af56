//! Analytic latency engines.
//!
//! - [`coverage`]: walk broadcast events over the cyclic scan-phase domain,
//!   claiming each event's footprint ([`FixedIntervalEngine`],
//!   [`AlternationEngine`], [`LossyAlternationEngine`]).
//! - [`exact`]: explicit enumeration of scan windows against compound
//!   uniform jitter and independent loss ([`ExactJitterLossEngine`]).
//!
//! All engines are deterministic and single-threaded. Every call to
//! [`LatencyEngine::simulate_all`] builds its coverage sets and accumulators
//! from scratch and drops them when it returns.

pub mod coverage;
pub mod exact;

pub use coverage::{AlternationEngine, FixedIntervalEngine, LossyAlternationEngine};
pub use exact::ExactJitterLossEngine;

use crate::config::ScanParams;
use crate::distribution::{LatencyDistribution, LatencyHistogram, OutputForm};
use crate::error::Result;
use crate::types::Interval;

/// Shared capability of every analytic engine.
pub trait LatencyEngine {
    /// Short engine name for logs and summaries.
    fn name(&self) -> &'static str;

    /// Full latency distribution with every unknown phase marginalized.
    fn simulate_all(&self, form: OutputForm) -> Result<LatencyDistribution>;
}

/// Sparse per-run result: `(latency, mass)` pairs in increasing latency
/// order plus the mass never discovered within the horizon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyMass {
    pub entries: Vec<(u64, f64)>,
    pub timeout: f64,
}

impl LatencyMass {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, m)| m).sum::<f64>() + self.timeout
    }

    /// Add into `hist`, every latency shifted by `shift`, all mass scaled by
    /// `weight`.
    pub fn add_to(&self, hist: &mut LatencyHistogram, shift: u64, weight: f64) {
        hist.add_shifted(&self.entries, shift, weight);
        if self.timeout > 0.0 {
            hist.add_timeout(self.timeout * weight);
        }
    }

    pub fn to_histogram(&self, end_time: u64) -> LatencyHistogram {
        let mut hist = LatencyHistogram::new(end_time);
        self.add_to(&mut hist, 0, 1.0);
        hist
    }
}

/// The one or two scan-phase sub-intervals for which an event at `t` falls
/// inside a scan window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    parts: [Interval; 2],
    count: usize,
}

impl Footprint {
    /// `[rel - W + 1, rel + 1)` with `rel = t mod S`, split in two when it
    /// wraps past 0.
    pub fn of(t: u64, scan: &ScanParams) -> Self {
        let s = scan.scan_interval;
        let w = scan.scan_window;
        let rel = t % s;
        if rel + 1 >= w {
            Self {
                parts: [
                    Interval {
                        start: rel + 1 - w,
                        end: rel + 1,
                    },
                    Interval { start: 0, end: 0 },
                ],
                count: 1,
            }
        } else {
            Self {
                parts: [
                    Interval {
                        start: s - (w - rel - 1),
                        end: s,
                    },
                    Interval {
                        start: 0,
                        end: rel + 1,
                    },
                ],
                count: 2,
            }
        }
    }

    pub fn parts(&self) -> &[Interval] {
        &self.parts[..self.count]
    }

    pub fn len(&self) -> u64 {
        self.parts().iter().map(Interval::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
