//! Probability-weighted coverage.
//!
//! Each stored fragment carries the residual probability that a phase inside
//! it has *not* been discovered yet. Phases outside every fragment have
//! residual 1. Claiming `[a, b)` with discovery probability `p` discovers
//! `residual * p` of each phase it touches and leaves `residual * (1 - p)`,
//! so two claims `p1`, `p2` over the same phase combine to
//! `1 - (1 - p1)(1 - p2)` discovered.

use super::{check_domain, CoverageModel};
use crate::constants::COVERAGE_EPSILON;
use crate::error::Result;
use crate::logging::RunLog;
use crate::types::{Interval, ProbInterval};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualFragment {
    pub interval: Interval,
    /// Probability the phase is still undiscovered.
    pub residual: f64,
}

#[derive(Debug, Clone)]
pub struct ProbabilisticIntervalCoverage {
    domain: Interval,
    /// Sorted, disjoint, residual strictly below 1; touching neighbours never
    /// share a residual.
    fragments: Vec<ResidualFragment>,
    coverage: f64,
}

impl ProbabilisticIntervalCoverage {
    pub fn new(domain: Interval) -> Self {
        Self {
            domain,
            fragments: Vec::new(),
            coverage: 0.0,
        }
    }

    pub fn over(len: u64) -> Self {
        Self::new(Interval { start: 0, end: len })
    }

    pub fn domain(&self) -> Interval {
        self.domain
    }

    pub fn fragments(&self) -> &[ResidualFragment] {
        &self.fragments
    }

    /// Cumulative discovered probability over the domain.
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// Residual undiscovered probability at a single phase.
    pub fn residual_at(&self, pos: u64) -> f64 {
        let idx = self.fragments.partition_point(|f| f.interval.end <= pos);
        match self.fragments.get(idx) {
            Some(f) if f.interval.start <= pos => f.residual,
            _ => 1.0,
        }
    }

    /// Merge a claim into the set.
    pub fn insert(&mut self, claim: ProbInterval) -> Result<()> {
        check_domain(&self.domain, &claim.interval)?;
        self.commit(claim);
        Ok(())
    }

    /// Newly discovered probability from `claim`, as a domain fraction.
    pub fn peek_new_coverage(&self, claim: ProbInterval) -> Result<f64> {
        check_domain(&self.domain, &claim.interval)?;
        Ok(self.measure(&claim) / self.domain.len() as f64)
    }

    pub fn new_coverage(&mut self, claim: ProbInterval, commit: bool) -> Result<f64> {
        if !commit {
            return self.peek_new_coverage(claim);
        }
        check_domain(&self.domain, &claim.interval)?;
        Ok(self.commit(claim))
    }

    pub fn new_coverage_all(&mut self, claims: &[ProbInterval]) -> Result<f64> {
        let mut total = 0.0;
        for &c in claims {
            total += self.new_coverage(c, true)?;
        }
        Ok(total)
    }

    /// `1 - coverage`, floored at 0.
    pub fn remain(&self) -> f64 {
        (1.0 - self.coverage).max(0.0)
    }

    /// `1 - coverage` without the floor; may dip below 0 through drift.
    pub fn raw_remain(&self) -> f64 {
        1.0 - self.coverage
    }

    /// Treat a negative remainder as fully covered. Returns whether it did.
    pub fn clamp_if_negative(&mut self) -> bool {
        if self.raw_remain() < 0.0 {
            self.coverage = 1.0;
            return true;
        }
        false
    }

    /// Σ over the claim of (length × residual × p), uncovered parts at residual 1.
    fn measure(&self, claim: &ProbInterval) -> f64 {
        let iv = claim.interval;
        let first = self.fragments.partition_point(|f| f.interval.end <= iv.start);
        let mut overlapped = 0u64;
        let mut weighted = 0.0;
        for f in self.fragments[first..]
            .iter()
            .take_while(|f| f.interval.start < iv.end)
        {
            let len = f.interval.overlap(&iv);
            overlapped += len;
            weighted += len as f64 * f.residual;
        }
        (weighted + (iv.len() - overlapped) as f64) * claim.p
    }

    fn commit(&mut self, claim: ProbInterval) -> f64 {
        let fraction = self.measure(&claim) / self.domain.len() as f64;
        let ProbInterval { interval: iv, p } = claim;
        if iv.is_empty() {
            return fraction;
        }
        let keep = 1.0 - p;
        let first = self.fragments.partition_point(|f| f.interval.end <= iv.start);

        let mut out: Vec<ResidualFragment> = Vec::with_capacity(self.fragments.len() + 3);
        out.extend_from_slice(&self.fragments[..first]);

        let mut cursor = iv.start;
        let mut i = first;
        while i < self.fragments.len() && self.fragments[i].interval.start < iv.end {
            let f = self.fragments[i];
            if f.interval.start < iv.start {
                push(&mut out, f.interval.start, iv.start, f.residual);
            }
            if cursor < f.interval.start {
                push(&mut out, cursor, f.interval.start, keep);
            }
            let lo = f.interval.start.max(iv.start);
            let hi = f.interval.end.min(iv.end);
            push(&mut out, lo, hi, f.residual * keep);
            if f.interval.end > iv.end {
                push(&mut out, iv.end, f.interval.end, f.residual);
            }
            cursor = hi;
            i += 1;
        }
        if cursor < iv.end {
            push(&mut out, cursor, iv.end, keep);
        }
        for &f in &self.fragments[i..] {
            push(&mut out, f.interval.start, f.interval.end, f.residual);
        }

        self.fragments = out;
        self.coverage += fraction;
        fraction
    }
}

/// Append a fragment, dropping empty or residual-1 pieces and coalescing
/// with a touching predecessor of identical residual.
fn push(out: &mut Vec<ResidualFragment>, start: u64, end: u64, residual: f64) {
    if start >= end || residual >= 1.0 {
        return;
    }
    if let Some(last) = out.last_mut() {
        if last.interval.end == start && last.residual == residual {
            last.interval.end = end;
            return;
        }
    }
    out.push(ResidualFragment {
        interval: Interval { start, end },
        residual,
    });
}

/// Footprint claims made by the loss-aware engine: every part carries the
/// same per-event success probability.
#[derive(Debug, Clone)]
pub(crate) struct LossyCoverage {
    pub(crate) inner: ProbabilisticIntervalCoverage,
    pub(crate) success: f64,
}

impl CoverageModel for LossyCoverage {
    fn claim(&mut self, parts: &[Interval]) -> Result<f64> {
        let mut total = 0.0;
        for &interval in parts {
            total += self.inner.new_coverage(
                ProbInterval {
                    interval,
                    p: self.success,
                },
                true,
            )?;
        }
        Ok(total)
    }

    fn remaining(&mut self, log: &RunLog) -> Result<f64> {
        if self.inner.raw_remain() < -COVERAGE_EPSILON && self.inner.clamp_if_negative() {
            log.warn(format_args!(
                "negative remaining coverage clamped to fully covered"
            ));
        }
        Ok(self.inner.remain())
    }

    fn exhausted(&self) -> bool {
        self.inner.remain() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(a: u64, b: u64, p: f64) -> ProbInterval {
        ProbInterval::new(a, b, p).unwrap()
    }

    #[test]
    fn test_repeated_claim_is_not_double_counted() {
        let mut cov = ProbabilisticIntervalCoverage::over(100);
        let first = cov.new_coverage(claim(5, 10, 0.3), true).unwrap();
        let second = cov.new_coverage(claim(5, 10, 0.3), false).unwrap();
        assert!((first - 0.015).abs() < 1e-12);
        assert!((second - 5.0 * 0.7 * 0.3 / 100.0).abs() < 1e-12);
        assert!(second < first);
    }

    #[test]
    fn test_overlap_combines_independently() {
        let mut cov = ProbabilisticIntervalCoverage::over(100);
        cov.insert(claim(10, 30, 0.4)).unwrap();
        cov.insert(claim(20, 40, 0.5)).unwrap();
        assert!((cov.residual_at(15) - 0.6).abs() < 1e-12);
        assert!((cov.residual_at(25) - 0.6 * 0.5).abs() < 1e-12);
        assert!((cov.residual_at(35) - 0.5).abs() < 1e-12);
        assert_eq!(cov.residual_at(45), 1.0);
        assert_eq!(cov.fragments().len(), 3);
    }

    #[test]
    fn test_claim_inside_fragment_splits_in_three() {
        let mut cov = ProbabilisticIntervalCoverage::over(100);
        cov.insert(claim(0, 50, 0.5)).unwrap();
        cov.insert(claim(20, 30, 0.5)).unwrap();
        let res: Vec<(u64, u64, f64)> = cov
            .fragments()
            .iter()
            .map(|f| (f.interval.start, f.interval.end, f.residual))
            .collect();
        assert_eq!(res, vec![(0, 20, 0.5), (20, 30, 0.25), (30, 50, 0.5)]);
    }

    #[test]
    fn test_claim_spanning_gaps() {
        let mut cov = ProbabilisticIntervalCoverage::over(100);
        cov.insert(claim(10, 20, 0.5)).unwrap();
        cov.insert(claim(30, 40, 0.5)).unwrap();
        let got = cov.new_coverage(claim(0, 50, 1.0), true).unwrap();
        // 30 fresh units plus 20 units at residual 0.5
        assert!((got - 0.40).abs() < 1e-12);
        assert!(cov.remain() < 0.5 + 1e-12);
        assert_eq!(cov.residual_at(15), 0.0);
    }

    #[test]
    fn test_full_certain_claim_exhausts() {
        let mut cov = ProbabilisticIntervalCoverage::over(64);
        cov.new_coverage(claim(0, 64, 1.0), true).unwrap();
        assert_eq!(cov.remain(), 0.0);
        assert!(!cov.clamp_if_negative());
    }

    #[test]
    fn test_clamp_negative() {
        let mut cov = ProbabilisticIntervalCoverage::over(10);
        cov.coverage = 1.0 + 1e-6;
        assert!(cov.clamp_if_negative());
        assert_eq!(cov.coverage(), 1.0);
        assert_eq!(cov.remain(), 0.0);
    }

    #[test]
    fn test_out_of_domain() {
        let mut cov = ProbabilisticIntervalCoverage::over(10);
        assert!(cov.insert(claim(5, 11, 0.5)).is_err());
    }

    #[test]
    fn test_coverage_matches_fragment_measure() {
        let mut cov = ProbabilisticIntervalCoverage::over(100);
        for (a, b) in [(5, 10), (15, 20), (20, 25), (12, 27), (20, 90), (20, 90)] {
            cov.new_coverage(claim(a, b, 0.7), true).unwrap();
        }
        let undiscovered: f64 = (0..100).map(|x| cov.residual_at(x)).sum::<f64>() / 100.0;
        assert!((cov.remain() - undiscovered).abs() < 1e-9);
    }
}
