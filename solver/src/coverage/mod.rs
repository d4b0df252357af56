//! Coverage of a bounded cyclic phase domain `[0, L)`.
//!
//! An engine walks broadcast events in increasing time order and, for each,
//! asks how much of the receiver's unknown scan phase the event's footprint
//! claims for the first time. That claimed measure is the probability the
//! event is the first one discovered.
//!
//! - [`boolean`]: a phase is either claimed or not ([`IntervalCoverage`]).
//! - [`probabilistic`]: a claim only discovers with some probability, so a
//!   phase carries the residual probability it is still undiscovered
//!   ([`ProbabilisticIntervalCoverage`]).
//!
//! [`CoverageModel`] is the seam the latency engines drive; both structures
//! implement it.

pub mod boolean;
pub mod probabilistic;

pub use boolean::IntervalCoverage;
pub use probabilistic::{ProbabilisticIntervalCoverage, ResidualFragment};

use crate::error::{LatencyError, Result};
use crate::logging::RunLog;
use crate::types::Interval;

/// What an engine needs from a coverage structure.
pub trait CoverageModel {
    /// Commit a footprint (one or two sub-intervals) and return the newly
    /// claimed probability mass as a fraction of the domain.
    fn claim(&mut self, parts: &[Interval]) -> Result<f64>;

    /// Probability mass not yet claimed. Called once per event; a structure
    /// may settle floating drift here.
    fn remaining(&mut self, log: &RunLog) -> Result<f64>;

    /// Nothing left to claim; later events cannot contribute.
    fn exhausted(&self) -> bool;
}

pub(crate) fn check_domain(domain: &Interval, iv: &Interval) -> Result<()> {
    if !domain.contains_interval(iv) {
        return Err(LatencyError::config(format!(
            "interval {iv} exceeds the interval limit {domain}"
        )));
    }
    Ok(())
}
