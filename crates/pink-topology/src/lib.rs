// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! SOM lattice topologies.
//!
//! A topology only answers three questions: how many neurons are there, how
//! far apart are two of them, and which neurons lie within a given radius of
//! a center. Everything above this layer (training, mapping, I/O) addresses
//! neurons purely by linear index and never inspects lattice coordinates
//! directly.

use pink_types::{Error, Result};

/// A lattice's neighbor structure and distance metric.
///
/// Implemented by [`CartesianLayout`] and [`HexagonalLayout`]. Both are
/// constructed once per run and treated as immutable afterwards, so the
/// trait requires no interior mutability.
pub trait Topology: Send + Sync {
    /// Total neuron count.
    fn size(&self) -> usize;

    /// Lattice distance between two neurons, addressed by linear index.
    fn distance(&self, a: usize, b: usize) -> f32;

    /// All neurons within `max_distance` of `center`, paired with their
    /// distance. `None` means unbounded: every neuron is returned.
    ///
    /// The default implementation is a full scan against [`Topology::distance`];
    /// it is correct for both lattice kinds and is only ever called once per
    /// training step, so there is no call for a lattice-specific shortcut.
    fn neighbors(&self, center: usize, max_distance: Option<f32>) -> Vec<(usize, f32)> {
        (0..self.size())
            .filter_map(|n| {
                let d = self.distance(center, n);
                match max_distance {
                    Some(max) if d > max => None,
                    _ => Some((n, d)),
                }
            })
            .collect()
    }
}

/// A cartesian grid of rank 1 to 3, addressed row-major (x fastest).
///
/// `extents` always has exactly the dimensionality implied by the
/// constructor arguments: trailing axes of length 1 are dropped, so a
/// `(width, 1, 1)` lattice is treated as 1-D.
#[derive(Debug, Clone)]
pub struct CartesianLayout {
    extents: Vec<u32>,
    pbc: bool,
}

impl CartesianLayout {
    pub fn new(width: u32, height: u32, depth: u32, pbc: bool) -> Result<Self> {
        if width < 2 {
            return Err(Error::Configuration(format!(
                "som_width must be at least 2, got {width}"
            )));
        }
        if height < 1 || depth < 1 {
            return Err(Error::Configuration(
                "som_height and som_depth must be at least 1".to_string(),
            ));
        }

        let mut extents = vec![width, height, depth];
        while extents.len() > 1 && *extents.last().unwrap() == 1 {
            extents.pop();
        }

        Ok(CartesianLayout { extents, pbc })
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    pub fn extents(&self) -> &[u32] {
        &self.extents
    }

    fn coord_of(&self, index: usize) -> Vec<u32> {
        let mut rem = index;
        let mut coord = Vec::with_capacity(self.extents.len());
        for &extent in &self.extents {
            coord.push((rem % extent as usize) as u32);
            rem /= extent as usize;
        }
        coord
    }

    /// Linear index for a coordinate in the same axis order as [`CartesianLayout::extents`].
    pub fn index_of(&self, coord: &[u32]) -> usize {
        debug_assert_eq!(coord.len(), self.extents.len());
        let mut index = 0usize;
        let mut stride = 1usize;
        for (c, extent) in coord.iter().zip(&self.extents) {
            index += *c as usize * stride;
            stride *= *extent as usize;
        }
        index
    }
}

impl Topology for CartesianLayout {
    fn size(&self) -> usize {
        self.extents.iter().map(|&e| e as usize).product()
    }

    fn distance(&self, a: usize, b: usize) -> f32 {
        let ca = self.coord_of(a);
        let cb = self.coord_of(b);
        let sum_sq: f32 = ca
            .iter()
            .zip(&cb)
            .zip(&self.extents)
            .map(|((&x, &y), &extent)| {
                let raw = (x as i64 - y as i64).unsigned_abs() as u32;
                let d = if self.pbc { raw.min(extent - raw) } else { raw };
                (d as f32) * (d as f32)
            })
            .sum();
        sum_sq.sqrt()
    }
}

/// A hexagonal rhombus of axial coordinates `(q, r)`, restricted to the
/// centered hex of "radius" `r = (width - 1) / 2`.
///
/// Periodic boundaries are not supported on hex lattices; construction
/// rejects `pbc = true`.
#[derive(Debug, Clone)]
pub struct HexagonalLayout {
    /// Axial coordinates in construction (and linear index) order.
    coords: Vec<(i32, i32)>,
    /// Inverse lookup from axial coordinate back to linear index.
    index_of_coord: std::collections::HashMap<(i32, i32), usize>,
}

impl HexagonalLayout {
    pub fn new(width: u32, height: u32, depth: u32, pbc: bool) -> Result<Self> {
        if pbc {
            return Err(Error::Configuration(
                "periodic boundary conditions are not supported on a hexagonal layout".to_string(),
            ));
        }
        if width != height {
            return Err(Error::Configuration(format!(
                "hexagonal layout requires a square extent, got width={width} height={height}"
            )));
        }
        if width % 2 == 0 {
            return Err(Error::Configuration(format!(
                "hexagonal layout requires an odd width, got {width}"
            )));
        }
        if depth != 1 {
            return Err(Error::Configuration(format!(
                "hexagonal layout requires depth 1, got {depth}"
            )));
        }

        let r = (width as i32 - 1) / 2;
        let mut coords = Vec::new();
        for q in -r..=r {
            for s in -r..=r {
                let rr = -q - s;
                if rr.abs() <= r {
                    coords.push((q, rr));
                }
            }
        }
        coords.sort_unstable();

        let index_of_coord = coords
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        Ok(HexagonalLayout {
            coords,
            index_of_coord,
        })
    }

    pub fn axial(&self, index: usize) -> (i32, i32) {
        self.coords[index]
    }
}

impl Topology for HexagonalLayout {
    fn size(&self) -> usize {
        self.coords.len()
    }

    fn distance(&self, a: usize, b: usize) -> f32 {
        let (qa, ra) = self.coords[a];
        let (qb, rb) = self.coords[b];
        let (dq, dr) = (qa - qb, ra - rb);
        let ds = -dq - dr;
        ((dq.abs() + dr.abs() + ds.abs()) as f32) / 2.0
    }

    /// BFS-style full scan, reusing [`Topology::neighbors`]'s default.
    /// Unlike the cartesian case there is no closed-form ring enumeration
    /// cheap enough to justify bypassing the default scan, since even the
    /// largest practical hex SOMs stay in the low thousands of neurons.
    fn neighbors(&self, center: usize, max_distance: Option<f32>) -> Vec<(usize, f32)> {
        (0..self.size())
            .filter_map(|n| {
                let d = self.distance(center, n);
                match max_distance {
                    Some(max) if d > max => None,
                    _ => Some((n, d)),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartesian_dimensionality_inferred_from_trivial_axes() {
        let layout = CartesianLayout::new(4, 1, 1, false).unwrap();
        assert_eq!(layout.rank(), 1);
        assert_eq!(layout.size(), 4);
    }

    #[test]
    fn cartesian_rejects_narrow_width() {
        assert!(CartesianLayout::new(1, 1, 1, false).is_err());
    }

    #[test]
    fn cartesian_pbc_wraps_across_the_extent() {
        let layout = CartesianLayout::new(4, 4, 1, true).unwrap();
        let a = layout.index_of(&[0, 0]);
        let b = layout.index_of(&[3, 0]);
        assert_eq!(layout.distance(a, b), 1.0);
    }

    #[test]
    fn cartesian_without_pbc_uses_raw_delta() {
        let layout = CartesianLayout::new(4, 4, 1, false).unwrap();
        let a = layout.index_of(&[0, 0]);
        let b = layout.index_of(&[3, 0]);
        assert_eq!(layout.distance(a, b), 3.0);
    }

    #[test]
    fn hex_cardinality_matches_closed_form() {
        for r in 0..5u32 {
            let width = 2 * r + 1;
            let layout = HexagonalLayout::new(width, width, 1, false).unwrap();
            let expected = 3 * r * (r + 1) + 1;
            assert_eq!(layout.size() as u32, expected);
        }
    }

    #[test]
    fn hex_rejects_pbc() {
        assert!(HexagonalLayout::new(5, 5, 1, true).is_err());
    }

    #[test]
    fn hex_rejects_non_square() {
        assert!(HexagonalLayout::new(5, 7, 1, false).is_err());
    }

    #[test]
    fn hex_rejects_even_width() {
        assert!(HexagonalLayout::new(4, 4, 1, false).is_err());
    }

    #[test]
    fn hex_rejects_depth_other_than_one() {
        assert!(HexagonalLayout::new(5, 5, 2, false).is_err());
    }

    #[test]
    fn hex_neighbors_of_center_are_distance_one() {
        let layout = HexagonalLayout::new(5, 5, 1, false).unwrap();
        let center = layout.index_of_coord[&(0, 0)];
        let within_one = layout.neighbors(center, Some(1.0));
        // center itself (distance 0) plus its 6 axial neighbors.
        assert_eq!(within_one.len(), 7);
    }
}
