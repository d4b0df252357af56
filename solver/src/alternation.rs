//! Alternation broadcast schedules: a cyclic sequence of positive gaps.

use std::fmt;

use rand::Rng;

use crate::error::{LatencyError, Result};

/// Read-only cycle of gap lengths with a cursor.
///
/// After [`set_start`](Self::set_start)`(i)` the first
/// [`advance`](Self::advance) returns element `(i + 1) % len`: the event at
/// the start of a run closes interval `i`, so the next gap is the following
/// element.
#[derive(Debug, Clone)]
pub struct AlternationSequence {
    lengths: Vec<u64>,
    cycle_length: u64,
    start_index: usize,
    cursor: usize,
}

impl AlternationSequence {
    pub fn new(lengths: Vec<u64>) -> Result<Self> {
        if lengths.is_empty() {
            return Err(LatencyError::config("alternation sequence is empty"));
        }
        if let Some(pos) = lengths.iter().position(|&l| l == 0) {
            return Err(LatencyError::config(format!(
                "non-positive interval at position {pos} of alternation sequence"
            )));
        }
        let cycle_length = lengths.iter().sum();
        Ok(Self {
            lengths,
            cycle_length,
            start_index: 0,
            cursor: 0,
        })
    }

    /// Expand `(length, repeat)` runs, e.g. `[(20, 3), (100, 1)]` is
    /// `[20, 20, 20, 100]`.
    pub fn from_runs(runs: &[(u64, usize)]) -> Result<Self> {
        let mut lengths = Vec::new();
        for &(length, repeat) in runs {
            if length == 0 {
                return Err(LatencyError::config(
                    "non-positive interval in alternation run",
                ));
            }
            if repeat == 0 {
                return Err(LatencyError::config(
                    "non-positive repeat count in alternation run",
                ));
            }
            lengths.extend(std::iter::repeat_n(length, repeat));
        }
        Self::new(lengths)
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<u64> {
        self.lengths.get(i).copied()
    }

    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    /// Sum of one full cycle.
    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn set_start(&mut self, i: usize) {
        let i = i % self.lengths.len();
        self.start_index = i;
        self.cursor = i;
    }

    /// Next gap; moves the cursor.
    pub fn advance(&mut self) -> u64 {
        self.cursor = (self.cursor + 1) % self.lengths.len();
        self.lengths[self.cursor]
    }

    /// Uniform absolute phase within one cycle, returned as the index of the
    /// interval containing it and the offset inside that interval.
    pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, u64) {
        let phase = rng.random_range(0..self.cycle_length);
        self.locate(phase)
    }

    /// Map an absolute phase in `[0, cycle_length)` to (index, offset).
    pub fn locate(&self, phase: u64) -> (usize, u64) {
        let mut rest = phase % self.cycle_length;
        for (i, &len) in self.lengths.iter().enumerate() {
            if rest < len {
                return (i, rest);
            }
            rest -= len;
        }
        unreachable!("phase is reduced modulo the cycle length")
    }
}

impl fmt::Display for AlternationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lengths)
    }
}
