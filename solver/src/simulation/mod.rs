//! Monte Carlo samplers used to cross-validate the analytic engines.
//!
//! - [`sampler`]: the [`LatencySampler`] capability (one draw, N draws in
//!   parallel, discover rate)
//! - [`periodic`]: fixed interval with uniform jitter and loss
//! - [`alternation`]: alternation sequence with loss

pub mod alternation;
pub mod periodic;
pub mod sampler;

pub use alternation::AlternationSampler;
pub use periodic::PeriodicSampler;
pub use sampler::LatencySampler;
