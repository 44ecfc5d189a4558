// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The concrete lattice a SOM is built over. Wrapping the two topology
//! implementations in an enum (rather than `Box<dyn Topology>`) keeps
//! coordinate-level helpers like [`Lattice::cartesian_index`] available to
//! callers that know which kind they constructed.

use pink_topology::{CartesianLayout, HexagonalLayout, Topology};
use pink_types::{Error, LayoutKind, Result};

#[derive(Debug, Clone)]
pub enum Lattice {
    Cartesian(CartesianLayout),
    Hexagonal(HexagonalLayout),
}

impl Lattice {
    pub fn new(
        kind: LayoutKind,
        width: u32,
        height: u32,
        depth: u32,
        pbc: bool,
    ) -> Result<Self> {
        match kind {
            LayoutKind::Cartesian => Ok(Lattice::Cartesian(CartesianLayout::new(
                width, height, depth, pbc,
            )?)),
            LayoutKind::Hexagonal => Ok(Lattice::Hexagonal(HexagonalLayout::new(
                width, height, depth, pbc,
            )?)),
        }
    }

    pub fn kind(&self) -> LayoutKind {
        match self {
            Lattice::Cartesian(_) => LayoutKind::Cartesian,
            Lattice::Hexagonal(_) => LayoutKind::Hexagonal,
        }
    }

    /// Linear index of a cartesian coordinate. Errors if this lattice is
    /// hexagonal; tests and file I/O that need coordinate addressing only
    /// ever do so on cartesian lattices.
    pub fn cartesian_index(&self, coord: &[u32]) -> Result<usize> {
        match self {
            Lattice::Cartesian(c) => Ok(c.index_of(coord)),
            Lattice::Hexagonal(_) => Err(Error::Configuration(
                "cartesian coordinate addressing requested on a hexagonal lattice".to_string(),
            )),
        }
    }
}

impl Topology for Lattice {
    fn size(&self) -> usize {
        match self {
            Lattice::Cartesian(c) => c.size(),
            Lattice::Hexagonal(h) => h.size(),
        }
    }

    fn distance(&self, a: usize, b: usize) -> f32 {
        match self {
            Lattice::Cartesian(c) => c.distance(a, b),
            Lattice::Hexagonal(h) => h.distance(a, b),
        }
    }

    fn neighbors(&self, center: usize, max_distance: Option<f32>) -> Vec<(usize, f32)> {
        match self {
            Lattice::Cartesian(c) => c.neighbors(center, max_distance),
            Lattice::Hexagonal(h) => h.neighbors(center, max_distance),
        }
    }
}
