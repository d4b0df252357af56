//! Compound-jitter table: repeated convolution with a uniform `{0..W}` kernel.
//!
//! Layer `k` is the unnormalized histogram of the sum of `k` independent
//! uniform `{0..W}` draws: `k * W + 1` bins, normalizer `(W + 1)^k`. Layer 0
//! is the point mass at 0.
//!
//! Layers are grown with a moving-window running sum, so each `extend()`
//! costs O(new layer size) regardless of `W`. While a layer holds integer
//! counts below 2^53 the running sum is exact and matches direct
//! convolution bit for bit.
//!
//! [`zero_at`](ConvolutionAccumulator::zero_at) and
//! [`attenuate_at`](ConvolutionAccumulator::attenuate_at) edit a layer in
//! place. After that the layer is a residual sub-distribution (it no longer
//! sums to its normalizer) and any layer extended from it carries the same
//! residual forward.

use crate::constants::ATTENUATION_SNAP;

#[derive(Debug, Clone)]
pub struct ConvolutionAccumulator {
    width: usize,
    layers: Vec<Vec<f64>>,
    normalizers: Vec<f64>,
}

impl ConvolutionAccumulator {
    /// Kernel uniform over `{0..=width}`. `width == 0` is the point kernel:
    /// every layer is `[1.0]`, which is how jitter-free schedules run.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            layers: vec![vec![1.0]],
            normalizers: vec![1.0],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Highest layer computed so far.
    pub fn watermark(&self) -> usize {
        self.layers.len() - 1
    }

    /// Append layer `watermark() + 1`. Returns its index.
    pub fn extend(&mut self) -> usize {
        let w = self.width;
        let prev = &self.layers[self.layers.len() - 1];
        let n_prev = prev.len();
        let n_next = n_prev + w;

        let mut next = Vec::with_capacity(n_next);
        let mut window = 0.0f64;
        for v in 0..n_next {
            if v < n_prev {
                window += prev[v];
            }
            if v > w {
                window -= prev[v - w - 1];
            }
            next.push(window);
        }

        let norm = self.normalizers[self.normalizers.len() - 1] * (w + 1) as f64;
        self.layers.push(next);
        self.normalizers.push(norm);
        self.watermark()
    }

    /// Extend until layer `k` exists. Idempotent.
    pub fn ensure(&mut self, k: usize) {
        while self.watermark() < k {
            self.extend();
        }
    }

    /// Layer `k` if already computed.
    pub fn layer(&self, k: usize) -> Option<&[f64]> {
        self.layers.get(k).map(Vec::as_slice)
    }

    /// `(W + 1)^k` if layer `k` is computed.
    pub fn normalizer(&self, k: usize) -> Option<f64> {
        self.normalizers.get(k).copied()
    }

    /// Unnormalized mass at `pos` of layer `k`; 0 outside the layer's support.
    pub fn value_at(&mut self, k: usize, pos: usize) -> f64 {
        self.ensure(k);
        self.layers[k].get(pos).copied().unwrap_or(0.0)
    }

    pub fn density_at(&mut self, k: usize, pos: usize) -> f64 {
        self.value_at(k, pos) / self.normalizers[k]
    }

    /// Normalized copy of layer `k`.
    pub fn pdf(&mut self, k: usize) -> Vec<f64> {
        self.ensure(k);
        let norm = self.normalizers[k];
        self.layers[k].iter().map(|&v| v / norm).collect()
    }

    /// Remove all mass at `pos` of layer `k`.
    pub fn zero_at(&mut self, k: usize, pos: usize) {
        self.ensure(k);
        if let Some(v) = self.layers[k].get_mut(pos) {
            *v = 0.0;
        }
    }

    /// Scale the mass at `pos` of layer `k` by `ratio`. A density that falls
    /// below [`ATTENUATION_SNAP`] is snapped to exactly zero.
    pub fn attenuate_at(&mut self, k: usize, pos: usize, ratio: f64) {
        self.ensure(k);
        let norm = self.normalizers[k];
        if let Some(v) = self.layers[k].get_mut(pos) {
            *v *= ratio;
            if *v / norm < ATTENUATION_SNAP {
                *v = 0.0;
            }
        }
    }
}
