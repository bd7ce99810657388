//! ASCII STL codec.
//!
//! Decoding does not follow a strict grammar. The text is split on the
//! literal `endfacet`; every segment before the last delimiter is one
//! facet, and each facet is scanned for its 12 numbers by
//! [`scan_facet`](super::tokenizer::scan_facet).
//!
//! Encoding writes one keyword per line with six fractional digits:
//!
//! ```text
//! solid <name>
//! facet normal 0.000000 0.000000 1.000000
//! outer loop
//! vertex 0.000000 0.000000 0.000000
//! vertex 1.000000 0.000000 0.000000
//! vertex 0.000000 1.000000 0.000000
//! endloop
//! endfacet
//! endsolid <name>
//! ```

use super::tokenizer::scan_facet;
use crate::batch::BatchScheduler;
use crate::mesh::{Mesh, Triangle};
use crate::{Error, Result};
use std::fmt::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delimiter that closes every facet.
pub const FACET_DELIMITER: &[u8] = b"endfacet";

/// Rough size of one encoded facet, used to presize segments.
const FACET_TEXT_HINT: usize = 200;

/// Split the text on [`FACET_DELIMITER`].
///
/// Always yields at least one segment; the number of facets is one less
/// than the number of segments.
pub fn split_facets(text: &[u8]) -> Vec<&[u8]> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(at) = find(rest, FACET_DELIMITER) {
        segments.push(&rest[..at]);
        rest = &rest[at + FACET_DELIMITER.len()..];
    }
    segments.push(rest);
    segments
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode ASCII STL text.
///
/// Facets that yield fewer than 12 numbers keep 0.0 in their unfilled
/// slots, unless `strict` is set, in which case each such facet is
/// reported as an [`Error::Facet`].
pub fn decode(text: &[u8], scheduler: &BatchScheduler, strict: bool) -> Result<Mesh> {
    let segments = split_facets(text);
    let facets = &segments[..segments.len() - 1];

    let incomplete = AtomicUsize::new(0);
    let mut triangles = vec![Triangle::default(); facets.len()];
    scheduler.fill(&mut triangles, |range, chunk| {
        for (slot, index) in chunk.iter_mut().zip(range) {
            let scan = scan_facet(facets[index]);
            if !scan.is_complete() {
                if strict {
                    return Err(Error::Facet {
                        index,
                        reason: format!(
                            "expected {} numbers, found {}",
                            Triangle::FLOAT_COUNT,
                            scan.filled
                        ),
                    });
                }
                incomplete.fetch_add(1, Ordering::Relaxed);
            }
            *slot = scan.triangle;
        }
        Ok(())
    })?;

    let incomplete = incomplete.into_inner();
    if incomplete > 0 {
        tracing::warn!(
            incomplete,
            facets = facets.len(),
            "ASCII facets with missing numbers, unfilled slots left at 0.0"
        );
    }

    Ok(Mesh::new(triangles))
}

/// Encode a mesh as ASCII STL text.
pub fn encode(mesh: &Mesh, solid_name: &str, scheduler: &BatchScheduler) -> Result<Vec<u8>> {
    let triangles = mesh.triangles();
    let segments = scheduler.map(triangles.len(), |range| {
        let mut segment = String::with_capacity(range.len() * FACET_TEXT_HINT);
        for tri in &triangles[range] {
            write_facet(&mut segment, tri)?;
        }
        Ok(segment)
    })?;

    let body: usize = segments.iter().map(String::len).sum();
    let mut text = String::with_capacity(body + 2 * solid_name.len() + 16);
    writeln!(text, "solid {}", solid_name)?;
    for segment in &segments {
        text.push_str(segment);
    }
    writeln!(text, "endsolid {}", solid_name)?;
    Ok(text.into_bytes())
}

fn write_facet(out: &mut String, tri: &Triangle) -> std::fmt::Result {
    let [n, v1, v2, v3] = &tri.vectors;
    writeln!(out, "facet normal {:.6} {:.6} {:.6}", n[0], n[1], n[2])?;
    out.push_str("outer loop\n");
    for v in [v1, v2, v3] {
        writeln!(out, "vertex {:.6} {:.6} {:.6}", v[0], v[1], v[2])?;
    }
    out.push_str("endloop\nendfacet\n");
    Ok(())
}
