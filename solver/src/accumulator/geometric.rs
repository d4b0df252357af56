//! Geometric first-success table.

use crate::error::{LatencyError, Result};

/// `P(first success at event k)` and `P(no success in events 0..=k)` for
/// independent events that each succeed with rate `r`.
#[derive(Debug, Clone)]
pub struct GeometricLossAccumulator {
    success_rate: f64,
    probability: Vec<f64>,
    survival: Vec<f64>,
}

impl GeometricLossAccumulator {
    /// `success_rate` must lie in `(0, 1]`.
    pub fn new(success_rate: f64) -> Result<Self> {
        if !(success_rate > 0.0 && success_rate <= 1.0) {
            return Err(LatencyError::config(format!(
                "success rate {success_rate} outside (0, 1]"
            )));
        }
        Ok(Self {
            success_rate,
            probability: Vec::new(),
            survival: Vec::new(),
        })
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    /// Number of entries computed so far.
    pub fn computed(&self) -> usize {
        self.probability.len()
    }

    /// `(1 - r)^k * r`: exactly `k` failures, then a success.
    pub fn probability_at(&mut self, k: usize) -> f64 {
        self.extend_to(k);
        self.probability[k]
    }

    /// `(1 - r)^(k + 1)`: events `0..=k` all failed.
    pub fn survival_at(&mut self, k: usize) -> f64 {
        self.extend_to(k);
        self.survival[k]
    }

    fn extend_to(&mut self, k: usize) {
        let fail = 1.0 - self.success_rate;
        while self.probability.len() <= k {
            let before = self.survival.last().copied().unwrap_or(1.0);
            self.probability.push(before * self.success_rate);
            self.survival.push(before * fail);
        }
    }
}
