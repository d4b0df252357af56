//! Deterministic coverage: a sorted, disjoint, maximally merged interval set.

use super::{check_domain, CoverageModel};
use crate::constants::COVERAGE_EPSILON;
use crate::error::{LatencyError, Result};
use crate::logging::RunLog;
use crate::types::{Interval, NewCoverage};

#[derive(Debug, Clone)]
pub struct IntervalCoverage {
    domain: Interval,
    /// Sorted by start; no two entries overlap or touch.
    intervals: Vec<Interval>,
    covered: u64,
    coverage: f64,
}

impl IntervalCoverage {
    pub fn new(domain: Interval) -> Self {
        Self {
            domain,
            intervals: Vec::new(),
            covered: 0,
            coverage: 0.0,
        }
    }

    /// Coverage over `[0, len)`.
    pub fn over(len: u64) -> Self {
        Self::new(Interval { start: 0, end: len })
    }

    pub fn domain(&self) -> Interval {
        self.domain
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn covered_len(&self) -> u64 {
        self.covered
    }

    /// Merge `iv` into the set (union).
    pub fn insert(&mut self, iv: Interval) -> Result<()> {
        check_domain(&self.domain, &iv)?;
        self.commit(iv);
        Ok(())
    }

    /// Portion of `iv` not already covered, without touching the set.
    pub fn peek_new_coverage(&self, iv: Interval) -> Result<NewCoverage> {
        check_domain(&self.domain, &iv)?;
        let length = iv.len() - self.overlap_len(&iv);
        Ok(NewCoverage {
            length,
            fraction: length as f64 / self.domain.len() as f64,
        })
    }

    /// Portion of `iv` not already covered; merged in when `commit` is set.
    pub fn new_coverage(&mut self, iv: Interval, commit: bool) -> Result<NewCoverage> {
        if !commit {
            return self.peek_new_coverage(iv);
        }
        check_domain(&self.domain, &iv)?;
        Ok(self.commit(iv))
    }

    /// Commit each interval in turn; later ones see earlier ones as covered.
    pub fn new_coverage_all(&mut self, ivs: &[Interval]) -> Result<NewCoverage> {
        let mut total = NewCoverage::default();
        for &iv in ivs {
            total += self.new_coverage(iv, true)?;
        }
        Ok(total)
    }

    /// Uncovered length.
    pub fn remain_len(&self) -> Result<u64> {
        self.domain
            .len()
            .checked_sub(self.covered)
            .ok_or(LatencyError::NumericFault {
                context: "interval coverage",
                remaining: self.domain.len() as f64 - self.covered as f64,
            })
    }

    /// Uncovered fraction, from the accumulated per-claim fractions.
    pub fn remain_fraction(&self) -> Result<f64> {
        let remain = 1.0 - self.coverage;
        if remain < -COVERAGE_EPSILON {
            return Err(LatencyError::NumericFault {
                context: "interval coverage",
                remaining: remain,
            });
        }
        Ok(remain.max(0.0))
    }

    fn overlap_len(&self, iv: &Interval) -> u64 {
        let first = self.intervals.partition_point(|x| x.end <= iv.start);
        self.intervals[first..]
            .iter()
            .take_while(|x| x.start < iv.end)
            .map(|x| x.overlap(iv))
            .sum()
    }

    fn commit(&mut self, iv: Interval) -> NewCoverage {
        let length = iv.len() - self.overlap_len(&iv);
        let fraction = length as f64 / self.domain.len() as f64;
        if !iv.is_empty() {
            let lo = self.intervals.partition_point(|x| x.end < iv.start);
            let hi = self.intervals.partition_point(|x| x.start <= iv.end);
            let mut merged = iv;
            if lo < hi {
                merged.start = merged.start.min(self.intervals[lo].start);
                merged.end = merged.end.max(self.intervals[hi - 1].end);
            }
            self.intervals.splice(lo..hi, [merged]);
        }
        self.covered += length;
        self.coverage += fraction;
        NewCoverage { length, fraction }
    }
}

impl CoverageModel for IntervalCoverage {
    fn claim(&mut self, parts: &[Interval]) -> Result<f64> {
        Ok(self.new_coverage_all(parts)?.fraction)
    }

    fn remaining(&mut self, _log: &RunLog) -> Result<f64> {
        self.remain_fraction()?;
        Ok(self.remain_len()? as f64 / self.domain.len() as f64)
    }

    fn exhausted(&self) -> bool {
        self.covered >= self.domain.len()
    }
}
