//! Flavor detection.
//!
//! ASCII STL files start with the keyword `solid`; anything else is treated
//! as binary. Only the first five bytes are inspected.

use super::Flavor;
use crate::Result;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Number of bytes inspected to classify a file.
pub const SNIFF_LEN: usize = 5;

const ASCII_KEYWORD: &[u8; SNIFF_LEN] = b"solid";

/// Classify the stream by its next five bytes.
///
/// The stream position is restored afterwards, so the caller can decode
/// from where it started. Streams shorter than five bytes fail with an
/// `UnexpectedEof` I/O error.
pub fn sniff<R: Read + Seek>(reader: &mut R) -> Result<Flavor> {
    let start = reader.stream_position()?;

    let mut prefix = [0u8; SNIFF_LEN];
    reader.read_exact(&mut prefix).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file too short to classify as STL (need 5 bytes)",
            )
        } else {
            e
        }
    })?;

    reader.seek(SeekFrom::Start(start))?;
    Ok(classify(&prefix))
}

/// Classify an in-memory buffer.
pub fn sniff_bytes(bytes: &[u8]) -> Result<Flavor> {
    sniff(&mut Cursor::new(bytes))
}

fn classify(prefix: &[u8; SNIFF_LEN]) -> Flavor {
    if prefix.eq_ignore_ascii_case(ASCII_KEYWORD) {
        Flavor::Ascii
    } else {
        Flavor::Binary
    }
}
