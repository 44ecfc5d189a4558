// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The binary header shared by data files, SOM files, and map-output files
//! (see SPEC_FULL §6): `#`-prefixed ASCII comment lines, skipped on read,
//! followed by a little-endian binary body starting with three reserved
//! `int32`s, `number_of_entries`, `layout_code`, `dimensionality`, then
//! `dimensionality` extents.

use pink_types::{Error, Result};
use std::io::{BufRead, Write};

/// Parsed file header, immediately preceding a stream of row-major `f32`
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Preserved verbatim on write; the first slot commonly carries a
    /// format/version tag in the original tool, the other two are unused.
    pub reserved: [i32; 3],
    pub number_of_entries: u32,
    pub layout_code: i32,
    pub extents: Vec<u32>,
}

impl FileHeader {
    pub fn new(number_of_entries: u32, layout_code: i32, extents: Vec<u32>) -> Self {
        FileHeader {
            reserved: [0, 0, 0],
            number_of_entries,
            layout_code,
            extents,
        }
    }

    pub fn dimensionality(&self) -> usize {
        self.extents.len()
    }

    pub fn payload_len(&self) -> usize {
        self.extents.iter().map(|&e| e as usize).product()
    }
}

fn read_i32<R: BufRead>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| Error::Io(format!("truncated binary header: {e}")))?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32<R: BufRead>(r: &mut R) -> Result<u32> {
    read_i32(r).map(|v| v as u32)
}

/// Skips any leading `#`-prefixed ASCII lines, then reads the binary header
/// that follows. `reader` must be positioned at the start of the file.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<FileHeader> {
    loop {
        let peek = reader
            .fill_buf()
            .map_err(|e| Error::Io(format!("failed to read header: {e}")))?;
        match peek.first() {
            Some(b'#') => {
                let mut line = String::new();
                reader
                    .read_line(&mut line)
                    .map_err(|e| Error::Io(format!("failed to read comment line: {e}")))?;
            }
            Some(_) => break,
            None => return Err(Error::Io("file ended before binary header".to_string())),
        }
    }

    let reserved = [read_i32(reader)?, read_i32(reader)?, read_i32(reader)?];
    let number_of_entries = read_u32(reader)?;
    let layout_code = read_i32(reader)?;
    let dimensionality = read_u32(reader)? as usize;

    if dimensionality == 0 || dimensionality > 8 {
        return Err(Error::Io(format!(
            "implausible header dimensionality {dimensionality}"
        )));
    }

    let mut extents = Vec::with_capacity(dimensionality);
    for _ in 0..dimensionality {
        extents.push(read_u32(reader)?);
    }

    Ok(FileHeader {
        reserved,
        number_of_entries,
        layout_code,
        extents,
    })
}

/// Writes a single `#`-prefixed comment line followed by the binary header.
/// Readers of this format skip any number of such lines, so one is enough
/// to identify the file's producer.
pub fn write_header<W: Write>(writer: &mut W, comment: &str, header: &FileHeader) -> Result<()> {
    writeln!(writer, "# {comment}").map_err(|e| Error::Io(e.to_string()))?;
    writer
        .write_all(&header.reserved[0].to_le_bytes())
        .and_then(|_| writer.write_all(&header.reserved[1].to_le_bytes()))
        .and_then(|_| writer.write_all(&header.reserved[2].to_le_bytes()))
        .and_then(|_| writer.write_all(&header.number_of_entries.to_le_bytes()))
        .and_then(|_| writer.write_all(&header.layout_code.to_le_bytes()))
        .and_then(|_| writer.write_all(&(header.extents.len() as u32).to_le_bytes()))
        .map_err(|e| Error::Io(e.to_string()))?;
    for &extent in &header.extents {
        writer
            .write_all(&extent.to_le_bytes())
            .map_err(|e| Error::Io(e.to_string()))?;
    }
    Ok(())
}

/// Reads one row-major `f32` payload of `len` elements.
pub fn read_payload<R: BufRead>(reader: &mut R, len: usize) -> Result<Vec<f32>> {
    let mut bytes = vec![0u8; len * 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| Error::Io(format!("truncated payload: {e}")))?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Writes one row-major `f32` payload.
pub fn write_payload<W: Write>(writer: &mut W, payload: &[f32]) -> Result<()> {
    for &v in payload {
        writer
            .write_all(&v.to_le_bytes())
            .map_err(|e| Error::Io(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_round_trips_through_bytes() {
        let header = FileHeader::new(3, 0, vec![4, 4]);
        let mut buf = Vec::new();
        write_header(&mut buf, "pink data file", &header).unwrap();
        let mut cursor = Cursor::new(buf);
        let parsed = read_header(&mut cursor).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn multiple_comment_lines_are_all_skipped() {
        let header = FileHeader::new(1, 0, vec![2, 2]);
        let mut buf = Vec::new();
        buf.extend_from_slice(b"# first comment\n");
        buf.extend_from_slice(b"# second comment\n");
        let mut header_bytes = Vec::new();
        write_header(&mut header_bytes, "dummy", &header).unwrap();
        // Strip the single comment line `write_header` itself emitted so we
        // control exactly how many precede the binary body.
        let binary_start = header_bytes.iter().position(|&b| b == b'\n').unwrap() + 1;
        buf.extend_from_slice(&header_bytes[binary_start..]);

        let mut cursor = Cursor::new(buf);
        let parsed = read_header(&mut cursor).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn payload_round_trips() {
        let values = vec![1.0f32, -2.5, 3.25, 0.0];
        let mut buf = Vec::new();
        write_payload(&mut buf, &values).unwrap();
        let mut cursor = Cursor::new(buf);
        let parsed = read_payload(&mut cursor, values.len()).unwrap();
        assert_eq!(parsed, values);
    }
}
