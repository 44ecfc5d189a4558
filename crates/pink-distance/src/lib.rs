// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Distance-matrix computation between SOM neurons and the per-image
//! rotation/flip variant stack.
//!
//! A [`backend::ComputeBackend`] turns a neuron buffer and a variant stack
//! into, per neuron, the minimum squared distance over all variants and the
//! index of the variant that achieved it. CPU and (optionally) GPU
//! implementations must agree on ranking, not on raw accumulator values —
//! see [`pink_types::AccumulatorKind`].

pub mod backend;

pub use backend::{create_backend, CpuBackend, DistanceResult};
#[cfg(feature = "gpu")]
pub use backend::WgpuBackend;

/// Index into `[0, euclidean_distance_dim]` describing the centered crop
/// applied before distance accumulation.
pub(crate) fn crop_offset(dim: usize, crop_dim: usize) -> usize {
    (dim - crop_dim) / 2
}
