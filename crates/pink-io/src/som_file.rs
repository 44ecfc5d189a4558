// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! SOM file reader/writer (SPEC_FULL §6): the same binary layout as a data
//! file, with `layout_code` distinguishing cartesian-without-PBC (0),
//! cartesian-with-PBC (1), and hexagonal (2) so a `--map` run can
//! reconstruct the trained topology without being told it again.
//!
//! The header's `extents` carry `[width, height, depth, neuron_dim,
//! neuron_dim]` and `number_of_entries` is always 1 — the single payload is
//! the SOM's entire contiguous neuron buffer, neuron-major then
//! pixel-major, matching [`pink_som::Som::buffer`].

use crate::header::{read_header, read_payload, write_header, write_payload, FileHeader};
use pink_som::{InitMode, Lattice, Som};
use pink_topology::Topology;
use pink_types::{Element, Error, LayoutKind, Result};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

fn layout_code(kind: LayoutKind, pbc: bool) -> i32 {
    match (kind, pbc) {
        (LayoutKind::Cartesian, false) => 0,
        (LayoutKind::Cartesian, true) => 1,
        (LayoutKind::Hexagonal, _) => 2,
    }
}

fn decode_layout_code(code: i32) -> Result<(LayoutKind, bool)> {
    match code {
        0 => Ok((LayoutKind::Cartesian, false)),
        1 => Ok((LayoutKind::Cartesian, true)),
        2 => Ok((LayoutKind::Hexagonal, false)),
        other => Err(Error::Io(format!("unrecognized SOM file layout code {other}"))),
    }
}

/// Writes `som` to `path` in the PINK SOM file format.
pub fn write_som<T: Element, P: AsRef<Path>>(som: &Som<T>, path: P) -> Result<()> {
    let mut file = File::create(path.as_ref())
        .map_err(|e| Error::Io(format!("cannot create SOM file {}: {e}", path.as_ref().display())))?;

    let (kind, pbc, extents3) = match som.lattice() {
        Lattice::Cartesian(c) => {
            let e = c.extents();
            let w = e.first().copied().unwrap_or(1);
            let h = e.get(1).copied().unwrap_or(1);
            let d = e.get(2).copied().unwrap_or(1);
            (LayoutKind::Cartesian, false, [w, h, d])
        }
        Lattice::Hexagonal(_) => {
            // Hex width/height/depth are recovered from `r` on read, so the
            // extents on disk only need to be internally consistent with
            // `size()`; we derive width back out from `3r(r+1)+1`.
            let size = som.size() as f64;
            let mut r = 0u32;
            while 3 * r * (r + 1) + 1 < size as u32 {
                r += 1;
            }
            let width = 2 * r + 1;
            (LayoutKind::Hexagonal, false, [width, width, 1])
        }
    };

    let neuron_dim = som.neuron_dim() as u32;
    let header = FileHeader::new(
        1,
        layout_code(kind, pbc),
        vec![extents3[0], extents3[1], extents3[2], neuron_dim, neuron_dim],
    );
    write_header(&mut file, "pink SOM file", &header)?;

    let payload: Vec<f32> = som.buffer().iter().map(|&v| v.to_f32()).collect();
    write_payload(&mut file, &payload)?;
    file.flush().map_err(|e| Error::Io(e.to_string()))
}

/// Reads a SOM file, reconstructing the trained lattice and neuron buffer.
pub fn read_som<T: Element, P: AsRef<Path>>(path: P) -> Result<Som<T>> {
    let file = File::open(path.as_ref())
        .map_err(|e| Error::Io(format!("cannot open SOM file {}: {e}", path.as_ref().display())))?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader)?;

    if header.extents.len() != 5 {
        return Err(Error::Io(format!(
            "SOM file header expected 5 extents (w, h, d, neuron_dim, neuron_dim), got {}",
            header.extents.len()
        )));
    }
    let (kind, pbc) = decode_layout_code(header.layout_code)?;
    let [w, h, d, neuron_dim, neuron_dim_check] = [
        header.extents[0],
        header.extents[1],
        header.extents[2],
        header.extents[3],
        header.extents[4],
    ];
    if neuron_dim != neuron_dim_check {
        return Err(Error::Io(
            "SOM file neuron extents are not square".to_string(),
        ));
    }

    let lattice = Lattice::new(kind, w, h, d, pbc)?;
    let size = lattice.size();
    let payload = read_payload(&mut reader, header.payload_len())?;
    if payload.len() != size * neuron_dim as usize * neuron_dim as usize {
        return Err(Error::Io(format!(
            "SOM file payload length {} does not match {} neurons of dimension {}",
            payload.len(),
            size,
            neuron_dim
        )));
    }

    let buffer: Vec<T> = payload.into_iter().map(T::from_f32).collect();
    Ok(Som::from_buffer(lattice, neuron_dim as usize, buffer))
}

/// Resolves `--init` into a concrete neuron buffer: the three synthetic
/// modes construct a fresh SOM, `Path` reads an existing SOM file in place
/// of construction (the init-mode surface doesn't own file I/O, so loading
/// a path lives here rather than in `pink_som::InitMode`).
pub enum InitSpec {
    Synthetic(InitMode),
    FromFile(std::path::PathBuf),
}

pub fn build_som<T: Element>(
    spec: InitSpec,
    lattice: Lattice,
    neuron_dim: usize,
) -> Result<Som<T>> {
    match spec {
        InitSpec::Synthetic(mode) => Ok(Som::new(lattice, neuron_dim, mode)),
        InitSpec::FromFile(path) => read_som(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pink_som::InitMode;
    use pink_types::LayoutKind;

    #[test]
    fn cartesian_som_round_trips() {
        let lattice = Lattice::new(LayoutKind::Cartesian, 2, 3, 1, false).unwrap();
        let som: Som<f32> = Som::new(lattice, 2, InitMode::Random { seed: 3 });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("som.bin");
        write_som(&som, &path).unwrap();

        let loaded: Som<f32> = read_som(&path).unwrap();
        assert_eq!(loaded.size(), som.size());
        assert_eq!(loaded.neuron_dim(), som.neuron_dim());
        assert_eq!(loaded.buffer(), som.buffer());
    }

    #[test]
    fn hexagonal_som_round_trips_size() {
        let lattice = Lattice::new(LayoutKind::Hexagonal, 5, 5, 1, false).unwrap();
        let som: Som<f32> = Som::new(lattice, 2, InitMode::Zero);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("som_hex.bin");
        write_som(&som, &path).unwrap();

        let loaded: Som<f32> = read_som(&path).unwrap();
        assert_eq!(loaded.size(), 19);
        assert!(matches!(loaded.lattice(), Lattice::Hexagonal(_)));
    }
}
