// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Map-output writer (SPEC_FULL §6): per input, the `som_size`-element
//! distance vector and, when `--store-rot-flip` is set, a parallel
//! `som_size`-element `(flip_bit, rotation_index)` record.

use crate::header::{write_header, write_payload, FileHeader};
use pink_types::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streams one distance vector per mapped image to `result_file`, and
/// optionally one rotation/flip record per image to a second file.
pub struct MapResultWriter {
    distances: BufWriter<File>,
    rot_flip: Option<BufWriter<File>>,
    som_size: usize,
    num_rot: u32,
}

impl MapResultWriter {
    pub fn create<P: AsRef<Path>>(
        result_file: P,
        rot_flip_file: Option<P>,
        num_images: u32,
        som_size: usize,
        num_rot: u32,
    ) -> Result<Self> {
        let distances = create_with_header(
            result_file.as_ref(),
            "pink map result file",
            FileHeader::new(num_images, 0, vec![som_size as u32]),
        )?;

        let rot_flip = rot_flip_file
            .map(|path| {
                create_with_header(
                    path.as_ref(),
                    "pink map rotation/flip file",
                    FileHeader::new(num_images, 1, vec![som_size as u32, 2]),
                )
            })
            .transpose()?;

        Ok(MapResultWriter {
            distances,
            rot_flip,
            som_size,
            num_rot,
        })
    }

    /// Writes one image's outcome. `best_variant` is the argmin variant
    /// index per neuron, decoded into `(flip_bit, rotation_index)` when a
    /// rot-flip file was requested.
    pub fn write_step(&mut self, distances: &[f32], best_variant: &[usize]) -> Result<()> {
        if distances.len() != self.som_size || best_variant.len() != self.som_size {
            return Err(Error::Io(format!(
                "map step produced {} distances / {} rotations, expected {}",
                distances.len(),
                best_variant.len(),
                self.som_size
            )));
        }

        write_payload(&mut self.distances, distances)?;

        if let Some(writer) = self.rot_flip.as_mut() {
            let mut record = Vec::with_capacity(self.som_size * 2);
            for &v in best_variant {
                let flip_bit = (v / self.num_rot as usize) as f32;
                let rotation_index = (v % self.num_rot as usize) as f32;
                record.push(flip_bit);
                record.push(rotation_index);
            }
            write_payload(writer, &record)?;
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.distances.flush().map_err(|e| Error::Io(e.to_string()))?;
        if let Some(w) = self.rot_flip.as_mut() {
            w.flush().map_err(|e| Error::Io(e.to_string()))?;
        }
        Ok(())
    }
}

fn create_with_header(path: &Path, comment: &str, header: FileHeader) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| Error::Io(format!("cannot create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    write_header(&mut writer, comment, &header)?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{read_header, read_payload};
    use std::fs::File;
    use std::io::BufReader;

    #[test]
    fn distances_only_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let result_path = dir.path().join("result.bin");

        let mut writer =
            MapResultWriter::create(&result_path, None, 2, 4, 4).unwrap();
        writer.write_step(&[0.0, 1.0, 2.0, 3.0], &[0, 1, 2, 3]).unwrap();
        writer.write_step(&[4.0, 5.0, 6.0, 7.0], &[0, 1, 2, 3]).unwrap();
        writer.finish().unwrap();

        let file = File::open(&result_path).unwrap();
        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader).unwrap();
        assert_eq!(header.number_of_entries, 2);
        let first = read_payload(&mut reader, 4).unwrap();
        assert_eq!(first, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn rot_flip_record_decodes_variant_index() {
        let dir = tempfile::tempdir().unwrap();
        let result_path = dir.path().join("result.bin");
        let rot_flip_path = dir.path().join("rotflip.bin");

        // num_rot = 4, so variant index 5 (flip stack) decodes to flip_bit=1,
        // rotation_index=1.
        let mut writer = MapResultWriter::create(
            &result_path,
            Some(&rot_flip_path),
            1,
            1,
            4,
        )
        .unwrap();
        writer.write_step(&[0.0], &[5]).unwrap();
        writer.finish().unwrap();

        let file = File::open(&rot_flip_path).unwrap();
        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader).unwrap();
        let record = read_payload(&mut reader, header.payload_len()).unwrap();
        assert_eq!(record, vec![1.0, 1.0]);
    }
}
