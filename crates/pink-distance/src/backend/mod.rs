// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Compute backend abstraction: one interface, a CPU implementation always
//! available, and an optional GPU implementation behind the `gpu` feature.

mod cpu;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use cpu::CpuBackend;
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;

use pink_types::{AccumulatorKind, BackendKind, Element, Error, Result};

/// Per-neuron outcome of one distance-matrix pass over a variant stack.
#[derive(Debug, Clone)]
pub struct DistanceResult {
    /// Minimum squared distance to the winning variant, one per neuron.
    pub distances: Vec<f32>,
    /// Index into the variant stack of the variant that achieved it.
    pub best_variant: Vec<usize>,
}

impl DistanceResult {
    /// The neuron with the global minimum distance, tie-broken by lowest
    /// neuron index (first encountered during the scan).
    pub fn best_matching_neuron(&self) -> usize {
        let mut best = 0;
        for i in 1..self.distances.len() {
            if self.distances[i] < self.distances[best] {
                best = i;
            }
        }
        best
    }
}

/// Computes, for every neuron in a SOM, the minimum distance to a variant
/// stack and the index of the best variant.
///
/// Implementations are free to choose any internal reduction strategy as
/// long as the resulting ranking of neurons matches the `f32` reference
/// path exactly on well-separated distances (see
/// [`pink_types::AccumulatorKind`]).
pub trait ComputeBackend<T: Element>: Send + Sync {
    fn backend_name(&self) -> &str;

    /// `neurons` is `n_neurons * neuron_dim^2` elements, `variants` is
    /// `n_variants * neuron_dim^2` elements, both row-major per entry.
    /// `euclidean_distance_dim <= neuron_dim` selects the centered crop
    /// the reduction runs over.
    fn compute_distances(
        &self,
        neurons: &[T],
        n_neurons: usize,
        variants: &[T],
        n_variants: usize,
        neuron_dim: usize,
        euclidean_distance_dim: usize,
        accumulator: AccumulatorKind,
    ) -> Result<DistanceResult>;
}

/// Constructs a CPU backend, or a GPU backend if one is available and
/// requested. `Auto` prefers GPU when the `gpu` feature is compiled in and
/// an adapter can be found; it falls back to CPU silently otherwise, since
/// PINK workloads remain useful single-threaded.
pub fn create_backend<T: Element>(kind: BackendKind) -> Result<Box<dyn ComputeBackend<T>>>
where
    CpuBackend: ComputeBackend<T>,
{
    match kind {
        BackendKind::Cpu => Ok(Box::new(CpuBackend::new())),
        BackendKind::Auto => {
            #[cfg(feature = "gpu")]
            {
                if let Ok(gpu) = WgpuBackend::new() {
                    tracing::info!("auto-selected GPU backend");
                    return Ok(Box::new(gpu));
                }
            }
            tracing::debug!("auto-selection using CPU backend");
            Ok(Box::new(CpuBackend::new()))
        }
        #[cfg(feature = "gpu")]
        BackendKind::Wgpu => WgpuBackend::new()
            .map(|b| Box::new(b) as Box<dyn ComputeBackend<T>>)
            .map_err(|_| Error::BackendUnavailable("no WGPU adapter found".to_string())),
    }
}
