//! Binary STL codec.
//!
//! Layout (all numbers little-endian):
//!
//! ```text
//! [0, 80)    header, ignored on read, zero-filled on write
//! [80, 84)   u32 triangle count N
//! 84 + 50*i  record i:
//!              12 x f32   normal xyz, v1 xyz, v2 xyz, v3 xyz
//!              u16        attribute byte count, ignored on read, 0 on write
//! ```
//!
//! Truncated input is clipped: only the records that fit entirely in the
//! available bytes are decoded, and input shorter than the 84-byte preamble
//! decodes to an empty mesh.

use crate::batch::BatchScheduler;
use crate::mesh::{Mesh, Triangle, Vector3};
use crate::{Error, Result};

/// Size of the ignored header.
pub const HEADER_LEN: usize = 80;

/// Header plus triangle count.
pub const PREAMBLE_LEN: usize = HEADER_LEN + 4;

/// Size of one triangle record.
pub const RECORD_LEN: usize = 50;

/// The triangle count stored in the preamble, if the preamble is complete.
pub fn declared_count(bytes: &[u8]) -> Option<u32> {
    let count = bytes.get(HEADER_LEN..PREAMBLE_LEN)?;
    Some(u32::from_le_bytes([count[0], count[1], count[2], count[3]]))
}

/// Decode a binary STL buffer.
pub fn decode(bytes: &[u8], scheduler: &BatchScheduler) -> Result<Mesh> {
    let Some(declared) = declared_count(bytes) else {
        tracing::warn!(
            len = bytes.len(),
            "binary STL shorter than its preamble, decoding as empty"
        );
        return Ok(Mesh::default());
    };

    let declared = declared as usize;
    let available = (bytes.len() - PREAMBLE_LEN) / RECORD_LEN;
    let count = declared.min(available);
    if count < declared {
        tracing::warn!(declared, decoded = count, "binary STL truncated, clipping");
    }

    let records = &bytes[PREAMBLE_LEN..PREAMBLE_LEN + count * RECORD_LEN];
    let mut triangles = vec![Triangle::default(); count];
    scheduler.fill(&mut triangles, |range, chunk| {
        let batch = &records[range.start * RECORD_LEN..range.end * RECORD_LEN];
        for (tri, record) in chunk.iter_mut().zip(batch.chunks_exact(RECORD_LEN)) {
            *tri = read_record(record);
        }
        Ok(())
    })?;

    Ok(Mesh::new(triangles))
}

/// Encode a mesh as a binary STL buffer.
pub fn encode(mesh: &Mesh, scheduler: &BatchScheduler) -> Result<Vec<u8>> {
    let count = u32::try_from(mesh.triangle_count()).map_err(|_| {
        Error::Mesh(format!(
            "{} triangles exceed the binary STL limit of {}",
            mesh.triangle_count(),
            u32::MAX
        ))
    })?;

    let triangles = mesh.triangles();
    let segments = scheduler.map(triangles.len(), |range| {
        let mut segment = Vec::with_capacity(range.len() * RECORD_LEN);
        for tri in &triangles[range] {
            write_record(&mut segment, tri);
        }
        Ok(segment)
    })?;

    let mut buf = Vec::with_capacity(PREAMBLE_LEN + triangles.len() * RECORD_LEN);
    buf.extend_from_slice(&[0u8; HEADER_LEN]);
    buf.extend_from_slice(&count.to_le_bytes());
    for segment in &segments {
        buf.extend_from_slice(segment);
    }
    Ok(buf)
}

/// Read one 50-byte record.
fn read_record(record: &[u8]) -> Triangle {
    Triangle::new(
        read_vector(&record[0..12]),
        read_vector(&record[12..24]),
        read_vector(&record[24..36]),
        read_vector(&record[36..48]),
    )
}

/// Read a vector (3 floats) from bytes.
fn read_vector(data: &[u8]) -> Vector3 {
    [
        f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        f32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        f32::from_le_bytes([data[8], data[9], data[10], data[11]]),
    ]
}

/// Append one 50-byte record.
fn write_record(buf: &mut Vec<u8>, tri: &Triangle) {
    for value in tri.vectors.iter().flatten() {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    // Attribute byte count
    buf.extend_from_slice(&[0u8, 0u8]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> BatchScheduler {
        BatchScheduler::new(3).unwrap()
    }

    fn numbered_mesh(count: usize) -> Mesh {
        (0..count)
            .map(|i| {
                let base = i as f32;
                Triangle::from_floats(std::array::from_fn(|k| base + k as f32 * 0.25))
            })
            .collect()
    }

    #[test]
    fn test_read_vector() {
        let x: f32 = 1.5;
        let y: f32 = 2.5;
        let z: f32 = 3.5;

        let mut data = Vec::new();
        data.extend_from_slice(&x.to_le_bytes());
        data.extend_from_slice(&y.to_le_bytes());
        data.extend_from_slice(&z.to_le_bytes());

        assert_eq!(read_vector(&data), [1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_encode_layout() {
        let mesh = numbered_mesh(2);
        let bytes = encode(&mesh, &scheduler()).unwrap();

        assert_eq!(bytes.len(), PREAMBLE_LEN + 2 * RECORD_LEN);
        assert!(bytes[..HEADER_LEN].iter().all(|&b| b == 0));
        assert_eq!(declared_count(&bytes), Some(2));

        let second = &bytes[PREAMBLE_LEN + RECORD_LEN..];
        assert_eq!(&second[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&second[44..48], &(1.0f32 + 11.0 * 0.25).to_le_bytes());
        assert_eq!(&second[48..50], &[0, 0]);
    }

    #[test]
    fn test_decode_ignores_header_and_attributes() {
        let mesh = numbered_mesh(4);
        let mut bytes = encode(&mesh, &scheduler()).unwrap();
        bytes[..HEADER_LEN].copy_from_slice(&[b'x'; HEADER_LEN]);
        let attr = PREAMBLE_LEN + RECORD_LEN + 48;
        bytes[attr..attr + 2].copy_from_slice(&[0xff, 0x7f]);

        let decoded = decode(&bytes, &scheduler()).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn test_decode_zero_triangles() {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let mesh = decode(&bytes, &scheduler()).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.triangles().is_empty());
    }

    #[test]
    fn test_decode_short_input_is_empty() {
        assert!(decode(&[], &scheduler()).unwrap().is_empty());
        assert!(decode(&[1u8; 83], &scheduler()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated_input_is_clipped() {
        let mesh = numbered_mesh(5);
        let bytes = encode(&mesh, &scheduler()).unwrap();

        // Cut into the middle of the fourth record.
        let cut = PREAMBLE_LEN + 3 * RECORD_LEN + 20;
        let decoded = decode(&bytes[..cut], &scheduler()).unwrap();

        assert_eq!(decoded.triangle_count(), 3);
        assert_eq!(decoded.triangles(), &mesh.triangles()[..3]);
    }

    #[test]
    fn test_decode_extra_trailing_bytes_ignored() {
        let mesh = numbered_mesh(2);
        let mut bytes = encode(&mesh, &scheduler()).unwrap();
        bytes.extend_from_slice(&[9u8; 75]);

        let decoded = decode(&bytes, &scheduler()).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn test_round_trip_bit_exact() {
        let mesh = Mesh::new(vec![Triangle::new(
            [f32::MIN_POSITIVE, -0.0, f32::MAX],
            [1.0e-30, -3.75, 1234.5678],
            [f32::EPSILON, 0.1, -0.1],
            [7.0, 8.0, 9.0],
        )]);
        let bytes = encode(&mesh, &scheduler()).unwrap();
        let decoded = decode(&bytes, &scheduler()).unwrap();

        let original = mesh.triangles()[0].to_floats();
        let back = decoded.triangles()[0].to_floats();
        for (a, b) in original.iter().zip(back.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
