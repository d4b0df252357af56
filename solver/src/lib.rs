//! # Discovery latency: analytic neighbor-discovery latency distributions
//!
//! A broadcaster emits advertising events on a schedule; a scanner listens
//! for `scan_window` ticks out of every `scan_interval`. This crate computes
//! the exact distribution of the time until the scanner first hears the
//! broadcaster, with every unknown phase marginalized, and cross-validates
//! the result against Monte Carlo samplers.
//!
//! ## Engines
//!
//! | Engine | Schedule | Loss | Rust module | Method |
//! |--------|----------|------|-------------|--------|
//! | Fixed interval | periodic | no | [`engine::coverage`] | cyclic scan-phase coverage, [`coverage::IntervalCoverage`] |
//! | Alternation | repeating sequence of intervals | no | [`engine::coverage`] | same, one pass per start index |
//! | Lossy alternation | repeating sequence | yes | [`engine::coverage`] | residual-probability coverage, [`coverage::ProbabilisticIntervalCoverage`] |
//! | Exact jitter + loss | periodic with uniform jitter | yes | [`engine::exact`] | window enumeration over [`accumulator::ConvolutionAccumulator`] layers |
//!
//! Every engine computes one pass with the broadcaster phase pinned to 0,
//! then marginalizes that phase with [`distribution::LatencyHistogram::spread_uniform`].
//!
//! ## Scan-phase domain
//!
//! The scan phase `x` is uniform on `[0, scan_interval)`. An event at time
//! `t` is heard for `x` in `[t mod S - W + 1, t mod S + 1)`, a cyclic
//! interval that splits in two when it wraps ([`engine::Footprint`]).
//! Coverage of this domain after each event gives the probability of
//! discovery by that event.
//!
//! ## Histogram layout
//!
//! Distributions have `end_time + 2` bins: latencies `0..=end_time`, then one
//! timeout bin at [`constants::timeout_index`] holding the mass never
//! discovered within the horizon.

#![allow(clippy::needless_range_loop)]

pub mod accumulator;
pub mod alternation;
pub mod config;
pub mod constants;
pub mod coverage;
pub mod distribution;
pub mod engine;
pub mod env_config;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod simulation;
pub mod types;

pub use error::{LatencyError, Result};
