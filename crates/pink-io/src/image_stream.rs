// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The on-disk image-stream iterator (SPEC_FULL §6): yields one row-major
//! (or channel-major, when `dimensionality > 2`) image per call from a
//! data file in the shared binary layout, exhausting after
//! `number_of_entries` images.

use crate::header::{read_header, read_payload, FileHeader};
use pink_types::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One decoded image: always `f32` samples (the file format stores floats
/// regardless of the SOM's own element type; callers narrow via
/// `pink_types::Element::from_f32` when training a `u8` SOM).
pub struct Image {
    pub pixels: Vec<f32>,
    /// Side length of the square spatial plane (`extents[0]`).
    pub spatial_dim: u32,
    /// Product of any axes beyond the first two (1 for plain 2D images).
    pub channels: u32,
}

/// Reads images one at a time from a data file, failing the whole run on a
/// malformed header or a short read mid-stream — there is no per-image
/// recovery (SPEC_FULL §4.8).
pub struct ImageStream {
    reader: BufReader<File>,
    header: FileHeader,
    yielded: u32,
}

impl ImageStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| Error::Io(format!("cannot open data file {}: {e}", path.as_ref().display())))?;
        let mut reader = BufReader::new(file);
        let header = read_header(&mut reader)?;
        if header.extents.is_empty() {
            return Err(Error::Io("data file header has no extents".to_string()));
        }
        Ok(ImageStream {
            reader,
            header,
            yielded: 0,
        })
    }

    /// Total number of images this stream will yield.
    pub fn num_entries(&self) -> u32 {
        self.header.number_of_entries
    }

    /// Side length of the square spatial plane every image shares.
    pub fn spatial_dim(&self) -> u32 {
        self.header.extents[0]
    }

    /// Product of every extent beyond the first two spatial axes.
    pub fn channels(&self) -> u32 {
        self.header.extents.iter().skip(2).product::<u32>().max(1)
    }

    fn next_image(&mut self) -> Result<Image> {
        let payload_len = self.header.payload_len();
        let pixels = read_payload(&mut self.reader, payload_len)?;
        self.yielded += 1;
        Ok(Image {
            pixels,
            spatial_dim: self.spatial_dim(),
            channels: self.channels(),
        })
    }
}

impl Iterator for ImageStream {
    type Item = Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.header.number_of_entries {
            return None;
        }
        Some(self.next_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::write_header;
    use std::io::Write;

    fn write_data_file(path: &Path, entries: &[Vec<f32>], extents: Vec<u32>) {
        let mut file = File::create(path).unwrap();
        let header = FileHeader::new(entries.len() as u32, 0, extents);
        write_header(&mut file, "pink test data file", &header).unwrap();
        for entry in entries {
            for &v in entry {
                file.write_all(&v.to_le_bytes()).unwrap();
            }
        }
    }

    #[test]
    fn yields_every_entry_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let entries = vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]];
        write_data_file(&path, &entries, vec![2, 2]);

        let stream = ImageStream::open(&path).unwrap();
        assert_eq!(stream.num_entries(), 2);
        assert_eq!(stream.spatial_dim(), 2);
        assert_eq!(stream.channels(), 1);

        let collected: Vec<Vec<f32>> = stream.map(|img| img.unwrap().pixels).collect();
        assert_eq!(collected, entries);
    }

    #[test]
    fn channel_major_dimensionality_reports_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let entries = vec![vec![0.0; 2 * 2 * 3]];
        write_data_file(&path, &entries, vec![2, 2, 3]);

        let stream = ImageStream::open(&path).unwrap();
        assert_eq!(stream.channels(), 3);
    }

    #[test]
    fn short_file_is_an_io_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let mut file = File::create(&path).unwrap();
        let header = FileHeader::new(2, 0, vec![2, 2]);
        write_header(&mut file, "pink test data file", &header).unwrap();
        file.write_all(&1.0f32.to_le_bytes()).unwrap(); // truncated entry

        let mut stream = ImageStream::open(&path).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
    }
}
