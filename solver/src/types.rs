//! Core value types: half-open intervals over a bounded coordinate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LatencyError, Result};

/// Half-open integer range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Build `[start, end)`. `start > end` is a configuration error; an empty
    /// interval (`start == end`) is allowed and covers nothing.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(LatencyError::config(format!(
                "interval [{start}, {end}) has start after end"
            )));
        }
        Ok(Self { start, end })
    }

    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Length of the intersection with `other`.
    #[inline(always)]
    pub fn overlap(&self, other: &Interval) -> u64 {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        hi.saturating_sub(lo)
    }

    #[inline(always)]
    pub fn contains_interval(&self, other: &Interval) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// An interval claimed with a discovery probability `p`: any phase inside it
/// is discovered by this claim with probability `p`, independently of every
/// other claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbInterval {
    pub interval: Interval,
    pub p: f64,
}

impl ProbInterval {
    pub fn new(start: u64, end: u64, p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(LatencyError::config(format!(
                "discovery probability {p} outside [0, 1]"
            )));
        }
        Ok(Self {
            interval: Interval::new(start, end)?,
            p,
        })
    }
}

/// Portion of a queried interval not already covered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NewCoverage {
    /// Uncovered length in coordinate units.
    pub length: u64,
    /// `length` as a fraction of the domain.
    pub fraction: f64,
}

impl std::ops::AddAssign for NewCoverage {
    fn add_assign(&mut self, rhs: Self) {
        self.length += rhs.length;
        self.fraction += rhs.fraction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Interval::new(5, 10).unwrap();
        assert_eq!(a.overlap(&Interval::new(0, 7).unwrap()), 2);
        assert_eq!(a.overlap(&Interval::new(8, 20).unwrap()), 2);
        assert_eq!(a.overlap(&Interval::new(10, 20).unwrap()), 0);
        assert_eq!(a.overlap(&Interval::new(0, 100).unwrap()), 5);
    }

    #[test]
    fn test_reversed_interval_rejected() {
        assert!(Interval::new(10, 5).is_err());
        assert!(ProbInterval::new(0, 5, 1.5).is_err());
    }
}
