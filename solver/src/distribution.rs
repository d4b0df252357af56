//! Dense latency histograms and normalized distributions.
//!
//! Every array has `end_time + 2` bins. Bin `l <= end_time` holds the mass of
//! "first discovered at time `l`"; the last bin holds "not discovered within
//! the horizon". Any mass pushed past `end_time` lands in that last bin.

use serde::{Deserialize, Serialize};

use crate::constants::{histogram_len, timeout_index};
use crate::error::{LatencyError, Result};

/// Shape of a returned distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputForm {
    /// Probability mass per latency.
    #[default]
    Pdf,
    /// Cumulative mass, last entry exactly 1.0.
    Cdf,
}

/// Unnormalized latency mass accumulated by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyHistogram {
    end_time: u64,
    bins: Vec<f64>,
}

impl LatencyHistogram {
    pub fn new(end_time: u64) -> Self {
        Self {
            end_time,
            bins: vec![0.0; histogram_len(end_time)],
        }
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    #[inline(always)]
    pub fn timeout_index(&self) -> usize {
        timeout_index(self.end_time)
    }

    /// Add mass at `latency`, clamped into the timeout bin.
    #[inline(always)]
    pub fn add(&mut self, latency: u64, mass: f64) {
        let idx = latency.min(self.timeout_index() as u64) as usize;
        self.bins[idx] += mass;
    }

    pub fn add_timeout(&mut self, mass: f64) {
        let idx = self.timeout_index();
        self.bins[idx] += mass;
    }

    /// Add a sparse `(latency, mass)` list shifted by `shift` and scaled by
    /// `weight`.
    pub fn add_shifted(&mut self, entries: &[(u64, f64)], shift: u64, weight: f64) {
        for &(latency, mass) in entries {
            if mass > 0.0 {
                self.add(latency.saturating_add(shift), mass * weight);
            }
        }
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Bin-wise sum with a histogram over the same horizon.
    pub fn accumulate(&mut self, other: &LatencyHistogram) {
        debug_assert_eq!(self.end_time, other.end_time);
        for (dst, src) in self.bins.iter_mut().zip(&other.bins) {
            *dst += src;
        }
    }

    /// Marginalize a uniform offset in `0..width`: the sum of `width` copies
    /// of the histogram shifted by 0, 1, .., width - 1. Uses a difference
    /// array, so the cost is linear in the number of bins.
    pub fn spread_uniform(&self, width: u64) -> Self {
        let timeout = self.timeout_index();
        let mut diff = vec![0.0f64; timeout + 1];
        let mut spilled = self.bins[timeout] * width as f64;

        for (l, &m) in self.bins[..timeout].iter().enumerate() {
            if m == 0.0 || width == 0 {
                continue;
            }
            let last = l as u64 + width - 1;
            let in_horizon_end = last.min(self.end_time) as usize;
            diff[l] += m;
            diff[in_horizon_end + 1] -= m;
            if last > self.end_time {
                spilled += m * (last - self.end_time) as f64;
            }
        }

        let mut out = Self::new(self.end_time);
        let mut running = 0.0;
        for (dst, d) in out.bins[..timeout].iter_mut().zip(&diff[..timeout]) {
            running += d;
            // the running sum can drift a few ulps below zero after a block closes
            *dst = running.max(0.0);
        }
        out.bins[timeout] = spilled;
        out
    }

    /// Normalize by total mass.
    pub fn into_distribution(self, form: OutputForm) -> Result<LatencyDistribution> {
        let total = self.total();
        if !(total > 0.0) || !total.is_finite() {
            return Err(LatencyError::NumericFault {
                context: "latency histogram normalization",
                remaining: total,
            });
        }
        let pdf = LatencyDistribution {
            end_time: self.end_time,
            form: OutputForm::Pdf,
            values: self.bins.into_iter().map(|m| m / total).collect(),
        };
        Ok(match form {
            OutputForm::Pdf => pdf,
            OutputForm::Cdf => pdf.to_cdf(),
        })
    }
}

/// Normalized latency distribution over `0..=end_time + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyDistribution {
    end_time: u64,
    form: OutputForm,
    values: Vec<f64>,
}

impl LatencyDistribution {
    /// Distribution of sampled latencies (values above `end_time` count as
    /// timeouts).
    pub fn empirical(samples: &[u64], end_time: u64, form: OutputForm) -> Result<Self> {
        if samples.is_empty() {
            return Err(LatencyError::config("no samples to build a distribution from"));
        }
        let mut hist = LatencyHistogram::new(end_time);
        for &s in samples {
            hist.add(s, 1.0);
        }
        hist.into_distribution(form)
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn form(&self) -> OutputForm {
        self.form
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cumulative form; the last entry is forced to exactly 1.0.
    pub fn to_cdf(&self) -> Self {
        let values = match self.form {
            OutputForm::Cdf => self.values.clone(),
            OutputForm::Pdf => {
                let mut acc = 0.0;
                let mut cdf: Vec<f64> = self
                    .values
                    .iter()
                    .map(|&p| {
                        acc += p;
                        acc
                    })
                    .collect();
                if let Some(last) = cdf.last_mut() {
                    *last = 1.0;
                }
                cdf
            }
        };
        Self {
            end_time: self.end_time,
            form: OutputForm::Cdf,
            values,
        }
    }

    pub fn to_pdf(&self) -> Self {
        let values = match self.form {
            OutputForm::Pdf => self.values.clone(),
            OutputForm::Cdf => {
                let mut prev = 0.0;
                self.values
                    .iter()
                    .map(|&c| {
                        let p = c - prev;
                        prev = c;
                        p
                    })
                    .collect()
            }
        };
        Self {
            end_time: self.end_time,
            form: OutputForm::Pdf,
            values,
        }
    }

    /// Probability of no discovery within the horizon.
    pub fn timeout_probability(&self) -> f64 {
        match self.form {
            OutputForm::Pdf => self.values[self.values.len() - 1],
            OutputForm::Cdf => 1.0 - self.values[self.values.len() - 2],
        }
    }

    /// Mean latency conditioned on discovery within the horizon.
    pub fn mean_discovered(&self) -> Option<f64> {
        let pdf = self.to_pdf();
        let found = &pdf.values[..pdf.values.len() - 1];
        let mass: f64 = found.iter().sum();
        if mass <= 0.0 {
            return None;
        }
        let weighted: f64 = found
            .iter()
            .enumerate()
            .map(|(l, &p)| l as f64 * p)
            .sum();
        Some(weighted / mass)
    }

    /// Smallest latency whose cumulative mass reaches `q`; the timeout
    /// index when the horizon is reached first.
    pub fn percentile(&self, q: f64) -> u64 {
        let cdf = self.to_cdf();
        cdf.values
            .iter()
            .position(|&c| c >= q)
            .unwrap_or(cdf.values.len() - 1) as u64
    }

    /// Root-mean-square difference between the two CDFs.
    pub fn rmse(&self, other: &LatencyDistribution) -> Result<f64> {
        if self.values.len() != other.values.len() {
            return Err(LatencyError::config(format!(
                "cannot compare distributions over horizons {} and {}",
                self.end_time, other.end_time
            )));
        }
        let a = self.to_cdf();
        let b = other.to_cdf();
        let sq: f64 = a
            .values
            .iter()
            .zip(&b.values)
            .map(|(x, y)| (x - y).powi(2))
            .sum();
        Ok((sq / a.values.len() as f64).sqrt())
    }
}
