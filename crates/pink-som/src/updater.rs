// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The Updater: moves every neuron within `max_update_distance` of the
//! winner toward the winning variant, weighted by the distribution kernel.

use crate::som::Som;
use pink_kernel::Kernel;
use pink_topology::Topology;
use pink_types::Element;

/// Applies one training step's neuron update.
///
/// `target` is the winning variant's pixels (length `neuron_size`); the
/// same image is used for every neighbor, rotation is not recomputed per
/// neighbor. Neurons with zero weight are skipped without touching memory.
pub fn apply_update<T: Element>(
    som: &mut Som<T>,
    winner: usize,
    target: &[T],
    kernel: &Kernel,
    max_update_distance: Option<f32>,
) {
    let neighbors = som.lattice().neighbors(winner, max_update_distance);
    for (n, d) in neighbors {
        let w = kernel.weight(d);
        if w == 0.0 {
            continue;
        }
        {
            let neuron = som.neuron_mut(n);
            for (px, &tpx) in neuron.iter_mut().zip(target.iter()) {
                *px = px.weighted_move(tpx, w);
            }
        }
        som.record_update(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Lattice;
    use crate::som::InitMode;
    use pink_types::{DistFunc, LayoutKind};

    #[test]
    fn zero_weight_neighbor_is_left_untouched() {
        let lattice = Lattice::new(LayoutKind::Cartesian, 4, 4, 1, false).unwrap();
        let mut som: Som<f32> = Som::new(lattice, 2, InitMode::Zero);
        let target = vec![10.0f32, 10.0, 10.0, 10.0];
        // A tiny sigma makes the far corner's weight underflow to exactly 0.
        let kernel = Kernel::new(DistFunc::Gaussian, 0.05, 1.0);
        apply_update(&mut som, 0, &target, &kernel, None);
        let far_corner = som.lattice().cartesian_index(&[3, 3]).unwrap();
        assert_eq!(som.update_count(far_corner), 0);
        assert!(som.neuron(far_corner).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn winner_itself_moves_fully_at_weight_one() {
        let lattice = Lattice::new(LayoutKind::Cartesian, 2, 2, 1, false).unwrap();
        let mut som: Som<f32> = Som::new(lattice, 2, InitMode::Zero);
        let target = vec![5.0f32, 5.0, 5.0, 5.0];
        let kernel = Kernel::new(DistFunc::Gaussian, 1.0, 1.0);
        apply_update(&mut som, 0, &target, &kernel, Some(0.0));
        assert_eq!(som.neuron(0), &[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(som.update_count(0), 1);
    }
}
