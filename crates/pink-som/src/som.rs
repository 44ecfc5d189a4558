// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The SOM container: one contiguous neuron buffer plus a lattice
//! descriptor. Everything above this module addresses neurons by linear
//! index; this is the one place that also understands lattice coordinates.

use crate::lattice::Lattice;
use pink_types::Element;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// How a freshly constructed SOM's neuron buffer is populated.
#[derive(Debug, Clone)]
pub enum InitMode {
    Zero,
    Random { seed: u64 },
    RandomPreferredDirection { seed: u64 },
}

/// Neuron buffer and lattice descriptor for one SOM.
///
/// The buffer is one contiguous `Vec<T>` of `size() * neuron_size`
/// elements; [`Som::neuron`]/[`Som::neuron_mut`] slice into it rather than
/// owning per-neuron allocations, matching the "entire neuron storage is
/// one contiguous buffer" layout.
pub struct Som<T: Element> {
    lattice: Lattice,
    neuron_dim: usize,
    buffer: Vec<T>,
    update_counts: Vec<u64>,
}

impl<T: Element> Som<T> {
    pub fn new(lattice: Lattice, neuron_dim: usize, init: InitMode) -> Self {
        let size = pink_topology::Topology::size(&lattice);
        let neuron_size = neuron_dim * neuron_dim;
        let buffer = match init {
            InitMode::Zero => vec![T::ZERO; size * neuron_size],
            InitMode::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..size * neuron_size)
                    .map(|_| T::from_f32(rng.gen_range(0.0..1.0)))
                    .collect()
            }
            InitMode::RandomPreferredDirection { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut buf = Vec::with_capacity(size * neuron_size);
                for _ in 0..size {
                    // Bias the first axis (x) toward higher values than the
                    // second (y) so neurons start with a directional prior
                    // instead of pure noise.
                    for y in 0..neuron_dim {
                        for x in 0..neuron_dim {
                            let bias = (x as f32) / (neuron_dim.max(1) as f32);
                            let base: f32 = rng.gen_range(0.0..1.0);
                            let _ = y;
                            buf.push(T::from_f32((base + bias) / 2.0));
                        }
                    }
                }
                buf
            }
        };

        Som {
            lattice,
            neuron_dim,
            buffer,
            update_counts: vec![0; size],
        }
    }

    pub fn from_buffer(lattice: Lattice, neuron_dim: usize, buffer: Vec<T>) -> Self {
        let size = pink_topology::Topology::size(&lattice);
        debug_assert_eq!(buffer.len(), size * neuron_dim * neuron_dim);
        Som {
            lattice,
            neuron_dim,
            buffer,
            update_counts: vec![0; size],
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn neuron_dim(&self) -> usize {
        self.neuron_dim
    }

    pub fn neuron_size(&self) -> usize {
        self.neuron_dim * self.neuron_dim
    }

    pub fn size(&self) -> usize {
        pink_topology::Topology::size(&self.lattice)
    }

    pub fn neuron(&self, index: usize) -> &[T] {
        let sz = self.neuron_size();
        &self.buffer[index * sz..(index + 1) * sz]
    }

    pub fn neuron_mut(&mut self, index: usize) -> &mut [T] {
        let sz = self.neuron_dim * self.neuron_dim;
        &mut self.buffer[index * sz..(index + 1) * sz]
    }

    /// Read-only iteration over every neuron's pixel slice.
    pub fn neurons(&self) -> impl Iterator<Item = &[T]> {
        let sz = self.neuron_size();
        self.buffer.chunks(sz)
    }

    /// Raw contiguous buffer, for the distance engine.
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    pub fn update_count(&self, index: usize) -> u64 {
        self.update_counts[index]
    }

    pub(crate) fn record_update(&mut self, index: usize) {
        self.update_counts[index] += 1;
    }

    /// No-op host-to-device mirror; present so callers don't need to
    /// special-case the absence of an accelerator.
    pub fn push_to_device(&self) {}

    /// No-op device-to-host mirror.
    pub fn pull_to_host(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pink_types::LayoutKind;

    fn cartesian_2x2() -> Lattice {
        Lattice::new(LayoutKind::Cartesian, 2, 2, 1, false).unwrap()
    }

    #[test]
    fn zero_init_fills_every_neuron_with_zero() {
        let som: Som<f32> = Som::new(cartesian_2x2(), 2, InitMode::Zero);
        for neuron in som.neurons() {
            assert!(neuron.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn buffer_is_contiguous_and_addressable_by_index() {
        let som: Som<f32> = Som::new(cartesian_2x2(), 2, InitMode::Zero);
        assert_eq!(som.buffer().len(), som.size() * som.neuron_size());
    }

    #[test]
    fn random_init_is_within_unit_range() {
        let som: Som<f32> = Som::new(cartesian_2x2(), 2, InitMode::Random { seed: 7 });
        for neuron in som.neurons() {
            for &v in neuron {
                assert!((0.0..1.0).contains(&v));
            }
        }
    }
}
