//! Lazily-extended probability tables.
//!
//! Both accumulators are append-only arenas with a "highest computed index"
//! watermark. Asking for an entry past the watermark extends the table one
//! step at a time; entries at or below it are never recomputed.
//!
//! - [`geometric`]: first-success and survival probabilities under
//!   independent per-event loss.
//! - [`convolution`]: compound uniform jitter, the k-fold convolution of a
//!   uniform `{0..W}` kernel.

pub mod convolution;
pub mod geometric;

pub use convolution::ConvolutionAccumulator;
pub use geometric::GeometricLossAccumulator;
