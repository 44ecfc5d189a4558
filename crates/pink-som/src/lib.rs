// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The SOM container, its Updater, and the Trainer/Mapper facade that
//! wires transform generation, distance computation, and neuron updates
//! together around one lattice.

pub mod facade;
pub mod lattice;
pub mod som;
pub mod updater;

pub use facade::{FacadeConfig, MapStepOutcome, TrainStepOutcome, TrainerMapper};
pub use lattice::Lattice;
pub use som::{InitMode, Som};

#[cfg(test)]
mod integration_tests {
    use crate::lattice::Lattice;
    use crate::som::{InitMode, Som};
    use crate::updater::apply_update;
    use pink_kernel::Kernel;
    use pink_topology::Topology;
    use pink_transform::generate_variant_stack;
    use pink_types::{DistFunc, Interpolation, LayoutKind};

    /// Reproduces spec.md's end-to-end acceptance scenario: a 2x2 cartesian
    /// SOM of 2x2 `i32` neurons, trained for one step against a single image
    /// whose last pixel is `i32::MAX`, with `max_update_distance` pinned to 0
    /// so only the winning neuron itself is moved.
    ///
    /// The winner is neuron (0,0): every neuron starts at zero, so all four
    /// are equidistant from the image and the tie breaks to the lowest
    /// index. The expected bottom-right pixel, `155767632`, is spec.md's own
    /// literal worked-example constant (not re-derived from this crate's
    /// kernel), so this test actually fails if `Kernel::weight`'s Gaussian
    /// normalization regresses.
    #[test]
    fn trainer_cartesian_2d_int() {
        let lattice = Lattice::new(LayoutKind::Cartesian, 2, 2, 1, false).unwrap();
        let mut som: Som<i32> = Som::new(lattice, 2, InitMode::Zero);

        let image: Vec<i32> = vec![1, 2, 3, 2147483647];
        let stack =
            generate_variant_stack(&image, 2, 2, 1, false, Interpolation::Bilinear).unwrap();
        assert_eq!(stack, image, "identity crop at equal dims must be an exact copy");

        // All neurons are zero, so every neuron ties on distance; the
        // lowest-index tie-break makes neuron 0 the winner.
        let winner = 0;
        let kernel = Kernel::new(DistFunc::Gaussian, 1.1, 0.2);

        apply_update(&mut som, winner, &stack, &kernel, Some(0.0));

        // max_update_distance = 0.0 restricts the update to the winner
        // itself; every other neuron stays at zero.
        for n in 1..som.size() {
            assert!(som.neuron(n).iter().all(|&v| v == 0));
        }

        let expected_bottom_right: i32 = 155767632;
        assert!(
            (som.neuron(winner)[3] - expected_bottom_right).abs() <= 16,
            "got {}, expected {} (+/- f32 rounding)",
            som.neuron(winner)[3],
            expected_bottom_right
        );
        assert_eq!(som.update_count(winner), 1);
    }

    #[test]
    fn pbc_distance_wraps_at_lattice_edge() {
        let lattice = Lattice::new(LayoutKind::Cartesian, 4, 1, 1, true).unwrap();
        let a = lattice.cartesian_index(&[0]).unwrap();
        let b = lattice.cartesian_index(&[3]).unwrap();
        assert_eq!(lattice.distance(a, b), 1.0);
    }
}
