// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! CPU backend: parallel across neurons via rayon, vectorizable inner pixel
//! loop. Accumulator precision is only meaningfully different for `u8`
//! element types, so `f32` and `u8` get separate trait implementations
//! rather than one generic one.

use super::{ComputeBackend, DistanceResult};
use crate::crop_offset;
use pink_types::{AccumulatorKind, Error, Result};
use rayon::prelude::*;

/// CPU compute backend. Stateless: all buffers are borrowed per call.
pub struct CpuBackend {
    name: &'static str,
}

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend { name: "cpu" }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Squared euclidean distance over the centered `crop_dim x crop_dim`
/// window of two `dim x dim` row-major arrays, accumulated in `f32`.
fn cropped_squared_distance_f32(a: &[f32], b: &[f32], dim: usize, crop_dim: usize) -> f32 {
    let off = crop_offset(dim, crop_dim);
    let mut acc = 0.0f32;
    for y in 0..crop_dim {
        let row = (y + off) * dim;
        for x in 0..crop_dim {
            let idx = row + x + off;
            let d = a[idx] - b[idx];
            acc += d * d;
        }
    }
    acc
}

impl ComputeBackend<f32> for CpuBackend {
    fn backend_name(&self) -> &str {
        self.name
    }

    fn compute_distances(
        &self,
        neurons: &[f32],
        n_neurons: usize,
        variants: &[f32],
        n_variants: usize,
        neuron_dim: usize,
        euclidean_distance_dim: usize,
        accumulator: AccumulatorKind,
    ) -> Result<DistanceResult> {
        if !matches!(accumulator, AccumulatorKind::Float) {
            tracing::debug!(
                requested = ?accumulator,
                "f32 SOM ignores non-float accumulator request, using float path"
            );
        }

        let neuron_size = neuron_dim * neuron_dim;
        let results: Vec<(f32, usize)> = (0..n_neurons)
            .into_par_iter()
            .map(|n| {
                let neuron = &neurons[n * neuron_size..(n + 1) * neuron_size];
                let mut best_dist = f32::INFINITY;
                let mut best_variant = 0usize;
                for v in 0..n_variants {
                    let variant = &variants[v * neuron_size..(v + 1) * neuron_size];
                    let d = cropped_squared_distance_f32(
                        neuron,
                        variant,
                        neuron_dim,
                        euclidean_distance_dim,
                    );
                    if d < best_dist {
                        best_dist = d;
                        best_variant = v;
                    }
                }
                (best_dist, best_variant)
            })
            .collect();

        let (distances, best_variant) = results.into_iter().unzip();
        Ok(DistanceResult {
            distances,
            best_variant,
        })
    }
}

/// Squared difference accumulated via a packed 4-wide signed dot product
/// when the crop width is a multiple of 4, falling back to scalar `f32`
/// accumulation on the remainder. This is a software emulation of the
/// `__dp4a`-style reduction the CUDA kernel performs in hardware; CPU SIMD
/// autovectorization handles the inner `i32` chunk well without intrinsics.
fn cropped_squared_distance_u8_packed(a: &[u8], b: &[u8], dim: usize, crop_dim: usize) -> i64 {
    let off = crop_offset(dim, crop_dim);
    let mut acc: i64 = 0;
    for y in 0..crop_dim {
        let row = (y + off) * dim;
        let mut x = 0usize;
        while x + 4 <= crop_dim {
            let mut chunk = 0i32;
            for k in 0..4 {
                let idx = row + x + k + off;
                let d = a[idx] as i32 - b[idx] as i32;
                chunk += d * d;
            }
            acc += chunk as i64;
            x += 4;
        }
        while x < crop_dim {
            let idx = row + x + off;
            let d = a[idx] as i32 - b[idx] as i32;
            acc += (d * d) as i64;
            x += 1;
        }
    }
    acc
}

fn cropped_squared_distance_u8_f32(a: &[u8], b: &[u8], dim: usize, crop_dim: usize) -> f32 {
    let off = crop_offset(dim, crop_dim);
    let mut acc = 0.0f32;
    for y in 0..crop_dim {
        let row = (y + off) * dim;
        for x in 0..crop_dim {
            let idx = row + x + off;
            let d = a[idx] as f32 - b[idx] as f32;
            acc += d * d;
        }
    }
    acc
}

/// Squared difference accumulated in `u16`, reporting overflow rather than
/// silently wrapping. The maximum single-pixel contribution is `255^2 =
/// 65025`, so even two pixels can overflow a `u16`; this path is only
/// practical for small crops and exists to satisfy the accumulator-choice
/// knob, not as the recommended setting for large images.
fn cropped_squared_distance_u8_u16(
    a: &[u8],
    b: &[u8],
    dim: usize,
    crop_dim: usize,
) -> Result<f32> {
    let off = crop_offset(dim, crop_dim);
    let mut acc: u16 = 0;
    for y in 0..crop_dim {
        let row = (y + off) * dim;
        for x in 0..crop_dim {
            let idx = row + x + off;
            let d = a[idx] as i32 - b[idx] as i32;
            let sq = (d * d) as u32;
            let sq: u16 = sq.try_into().map_err(|_| {
                Error::NumericOverflow(format!(
                    "single-pixel squared difference {sq} exceeds u16 range"
                ))
            })?;
            acc = acc.checked_add(sq).ok_or_else(|| {
                Error::NumericOverflow(
                    "u16 distance accumulator overflowed during reduction".to_string(),
                )
            })?;
        }
    }
    Ok(acc as f32)
}

impl ComputeBackend<u8> for CpuBackend {
    fn backend_name(&self) -> &str {
        self.name
    }

    fn compute_distances(
        &self,
        neurons: &[u8],
        n_neurons: usize,
        variants: &[u8],
        n_variants: usize,
        neuron_dim: usize,
        euclidean_distance_dim: usize,
        accumulator: AccumulatorKind,
    ) -> Result<DistanceResult> {
        let neuron_size = neuron_dim * neuron_dim;

        let results: Result<Vec<(f32, usize)>> = (0..n_neurons)
            .into_par_iter()
            .map(|n| {
                let neuron = &neurons[n * neuron_size..(n + 1) * neuron_size];
                let mut best_dist = f32::INFINITY;
                let mut best_variant = 0usize;
                for v in 0..n_variants {
                    let variant = &variants[v * neuron_size..(v + 1) * neuron_size];
                    let d = match accumulator {
                        AccumulatorKind::Float => cropped_squared_distance_u8_f32(
                            neuron,
                            variant,
                            neuron_dim,
                            euclidean_distance_dim,
                        ),
                        AccumulatorKind::Uint8 => {
                            if euclidean_distance_dim % 4 == 0 {
                                cropped_squared_distance_u8_packed(
                                    neuron,
                                    variant,
                                    neuron_dim,
                                    euclidean_distance_dim,
                                ) as f32
                            } else {
                                cropped_squared_distance_u8_f32(
                                    neuron,
                                    variant,
                                    neuron_dim,
                                    euclidean_distance_dim,
                                )
                            }
                        }
                        AccumulatorKind::Uint16 => cropped_squared_distance_u8_u16(
                            neuron,
                            variant,
                            neuron_dim,
                            euclidean_distance_dim,
                        )?,
                    };
                    if d < best_dist {
                        best_dist = d;
                        best_variant = v;
                    }
                }
                Ok((best_dist, best_variant))
            })
            .collect();

        let (distances, best_variant) = results?.into_iter().unzip();
        Ok(DistanceResult {
            distances,
            best_variant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_neuron_and_variant_have_zero_distance() {
        let backend = CpuBackend::new();
        let neurons = vec![1.0f32, 2.0, 3.0, 4.0];
        let variants = vec![1.0f32, 2.0, 3.0, 4.0];
        let result = backend
            .compute_distances(&neurons, 1, &variants, 1, 2, 2, AccumulatorKind::Float)
            .unwrap();
        assert_eq!(result.distances[0], 0.0);
        assert_eq!(result.best_variant[0], 0);
    }

    #[test]
    fn argmin_ties_break_to_lowest_variant_index() {
        let backend = CpuBackend::new();
        let neurons = vec![0.0f32, 0.0, 0.0, 0.0];
        let variants = vec![1.0f32, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let result = backend
            .compute_distances(&neurons, 1, &variants, 2, 2, 2, AccumulatorKind::Float)
            .unwrap();
        assert_eq!(result.best_variant[0], 0);
    }

    #[test]
    fn u8_accumulator_kinds_agree_on_ranking() {
        let backend = CpuBackend::new();
        let neurons = vec![10u8, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160];
        let variants = vec![12u8, 22, 28, 38, 200, 200, 200, 200, 202, 202, 202, 202, 204, 204, 204, 204];

        let float_result = backend
            .compute_distances(&neurons, 4, &variants, 1, 2, 2, AccumulatorKind::Float)
            .unwrap();
        let packed_result = backend
            .compute_distances(&neurons, 4, &variants, 1, 2, 2, AccumulatorKind::Uint8)
            .unwrap();

        assert_eq!(float_result.best_matching_neuron(), packed_result.best_matching_neuron());
    }

    #[test]
    fn u16_accumulator_reports_overflow() {
        let backend = CpuBackend::new();
        let neurons = vec![0u8; 16];
        let variants = vec![255u8; 16];
        let result = backend.compute_distances(&neurons, 1, &variants, 1, 4, 4, AccumulatorKind::Uint16);
        assert!(result.is_err());
    }
}
