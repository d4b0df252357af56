//! Environment configuration for the driver binary.
//!
//! `LATENCY_THREADS` (fallback `RAYON_NUM_THREADS`, default 8) sizes the
//! rayon pool used by the samplers; `RUST_LOG` drives the tracing filter.

use tracing_subscriber::EnvFilter;

fn thread_count() -> usize {
    std::env::var("LATENCY_THREADS")
        .or_else(|_| std::env::var("RAYON_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(8)
}

/// Build the global rayon pool. Tolerates an already-initialized pool.
/// Returns thread count.
pub fn init_rayon_threads() -> usize {
    let num_threads = thread_count();
    if rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .is_err()
    {
        tracing::debug!("rayon pool already initialized");
    }
    tracing::debug!(num_threads, "rayon threads");
    num_threads
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
