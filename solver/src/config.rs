//! Run parameters.
//!
//! All interval parameters share one integer time unit. `end_time` is the
//! inclusive horizon: a discovery at `end_time` still counts, anything later
//! lands in the timeout bucket.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_ADV_DELAY, DEFAULT_SAMPLE_COUNT};
use crate::error::{LatencyError, Result};

/// Receiver schedule and horizon shared by every engine and sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParams {
    pub scan_interval: u64,
    pub scan_window: u64,
    pub end_time: u64,
}

impl ScanParams {
    pub fn new(scan_interval: u64, scan_window: u64, end_time: u64) -> Result<Self> {
        let params = Self {
            scan_interval,
            scan_window,
            end_time,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-check a value that may have been deserialized directly.
    pub fn validate(&self) -> Result<()> {
        if self.scan_window == 0 {
            return Err(LatencyError::config("scan window must be positive"));
        }
        if self.scan_interval < self.scan_window {
            return Err(LatencyError::config(format!(
                "scan interval {} is less than scan window {}",
                self.scan_interval, self.scan_window
            )));
        }
        Ok(())
    }
}

/// Per-event loss probability, stored as a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LossRate(f64);

impl LossRate {
    pub const ZERO: LossRate = LossRate(0.0);

    pub fn from_fraction(fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(LatencyError::config(format!(
                "loss rate {fraction} outside [0, 1]"
            )));
        }
        Ok(Self(fraction))
    }

    pub fn from_percent(percent: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(LatencyError::config(format!(
                "loss rate {percent}% outside [0, 100]"
            )));
        }
        Ok(Self(percent / 100.0))
    }

    /// Lenient form used by samplers: out-of-range percentages are clamped
    /// into `[0, 100]` with a warning.
    pub fn clamped_percent(percent: f64) -> Self {
        if percent.is_nan() || percent < 0.0 {
            tracing::warn!(percent, "invalid loss rate, clamped to 0%");
            Self(0.0)
        } else if percent > 100.0 {
            tracing::warn!(percent, "invalid loss rate, clamped to 100%");
            Self(1.0)
        } else {
            Self(percent / 100.0)
        }
    }

    #[inline(always)]
    pub fn fraction(self) -> f64 {
        self.0
    }

    #[inline(always)]
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }

    /// Probability a single event gets through.
    #[inline(always)]
    pub fn success(self) -> f64 {
        1.0 - self.0
    }

    pub fn is_lossless(self) -> bool {
        self.0 == 0.0
    }
}

/// Explicit configuration shared by the empirical samplers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub scan: ScanParams,
    pub fail_rate: LossRate,
    pub max_adv_delay: u64,
}

impl SamplerConfig {
    pub fn new(scan: ScanParams, fail_rate: LossRate, max_adv_delay: u64) -> Self {
        Self {
            scan,
            fail_rate,
            max_adv_delay,
        }
    }

    /// `W{window}_T{interval}_F{loss%}_R{delay}_E{end}` label.
    pub fn identifier(&self) -> String {
        format!(
            "W{}_T{}_F{}_R{}_E{}",
            self.scan.scan_window,
            self.scan.scan_interval,
            self.fail_rate.percent().round() as u64,
            self.max_adv_delay,
            self.scan.end_time
        )
    }
}

/// Which analytic engine a driver run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Fixed,
    Alternation,
    Lossy,
    Exact,
}

impl EngineKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "alternation" => Some(Self::Alternation),
            "lossy" => Some(Self::Lossy),
            "exact" => Some(Self::Exact),
            _ => None,
        }
    }
}

fn default_samples() -> usize {
    DEFAULT_SAMPLE_COUNT
}

fn default_delay() -> u64 {
    DEFAULT_MAX_ADV_DELAY
}

/// One driver run, as read from a JSON file or assembled from flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub engine: EngineKind,
    #[serde(default)]
    pub adv_interval: Option<u64>,
    #[serde(default)]
    pub sequence: Vec<u64>,
    pub scan_interval: u64,
    pub scan_window: u64,
    pub end_time: u64,
    /// Percentage in `[0, 100]`.
    #[serde(default)]
    pub loss_percent: f64,
    #[serde(default = "default_delay")]
    pub max_adv_delay: u64,
    #[serde(default)]
    pub cdf: bool,
    /// Sampler draws for cross-validation; `None` skips validation.
    #[serde(default)]
    pub validate: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl ExperimentConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| LatencyError::config(format!("invalid experiment config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            LatencyError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn scan_params(&self) -> Result<ScanParams> {
        ScanParams::new(self.scan_interval, self.scan_window, self.end_time)
    }

    pub fn loss(&self) -> Result<LossRate> {
        LossRate::from_percent(self.loss_percent)
    }

    pub fn sample_count(&self) -> usize {
        self.validate.unwrap_or_else(default_samples)
    }

    pub fn adv_interval(&self) -> Result<u64> {
        match self.adv_interval {
            Some(a) if a > 0 => Ok(a),
            Some(_) => Err(LatencyError::config("advertising interval must be positive")),
            None => Err(LatencyError::config(format!(
                "engine {:?} requires an advertising interval",
                self.engine
            ))),
        }
    }
}
