//! Triangle and mesh types.
//!
//! A [`Mesh`] stores its triangles in file order. Face indices are meaningful
//! to downstream consumers, so no operation here reorders them.
//!
//! Meshes serialize to the fixture record used for round-trip comparisons:
//!
//! ```text
//! { "NumberOfTriangles": 2, "Triangles": [ [[nx,ny,nz],[x,y,z],[x,y,z],[x,y,z]], ... ] }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Three single-precision components (x, y, z).
pub type Vector3 = [f32; 3];

/// A facet: normal followed by three vertices.
///
/// Index 0 is the normal, indices 1..=3 are the vertices in winding order.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangle {
    pub vectors: [Vector3; 4],
}

impl Triangle {
    /// Index of the normal vector.
    pub const NORMAL: usize = 0;

    /// Number of floats in a facet record.
    pub const FLOAT_COUNT: usize = 12;

    /// Create a new triangle from a normal and three vertices.
    #[inline]
    pub const fn new(normal: Vector3, v1: Vector3, v2: Vector3, v3: Vector3) -> Self {
        Self {
            vectors: [normal, v1, v2, v3],
        }
    }

    /// Build a triangle from 12 floats in record order
    /// (normal xyz, v1 xyz, v2 xyz, v3 xyz).
    pub fn from_floats(floats: [f32; 12]) -> Self {
        let mut tri = Self::default();
        for (i, value) in floats.into_iter().enumerate() {
            tri.vectors[i / 3][i % 3] = value;
        }
        tri
    }

    /// The 12 floats of this triangle in record order.
    pub fn to_floats(&self) -> [f32; 12] {
        let mut floats = [0.0; 12];
        for (i, value) in self.vectors.iter().flatten().enumerate() {
            floats[i] = *value;
        }
        floats
    }

    /// The facet normal.
    #[inline]
    pub fn normal(&self) -> Vector3 {
        self.vectors[Self::NORMAL]
    }

    /// The three vertices.
    #[inline]
    pub fn vertices(&self) -> [Vector3; 3] {
        [self.vectors[1], self.vectors[2], self.vectors[3]]
    }

    /// The vector at position i (0 = normal, 1..=3 = vertices).
    #[inline]
    pub fn vector(&self, i: usize) -> Vector3 {
        self.vectors[i]
    }

    /// Whether every component is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Triangle, tolerance: f32) -> bool {
        self.vectors
            .iter()
            .flatten()
            .zip(other.vectors.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl fmt::Debug for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [n, a, b, c] = &self.vectors;
        write!(
            f,
            "Triangle(n={:?}, v1={:?}, v2={:?}, v3={:?})",
            n, a, b, c
        )
    }
}

impl From<[Vector3; 4]> for Triangle {
    #[inline]
    fn from(vectors: [Vector3; 4]) -> Self {
        Self { vectors }
    }
}

impl From<Triangle> for [Vector3; 4] {
    #[inline]
    fn from(tri: Triangle) -> Self {
        tri.vectors
    }
}

/// Serialized shape of a [`Mesh`].
#[derive(Serialize, Deserialize)]
struct MeshRecord {
    #[serde(rename = "NumberOfTriangles")]
    number_of_triangles: usize,
    #[serde(rename = "Triangles")]
    triangles: Vec<Triangle>,
}

impl TryFrom<MeshRecord> for Mesh {
    type Error = Error;

    fn try_from(record: MeshRecord) -> Result<Self> {
        if record.number_of_triangles != record.triangles.len() {
            return Err(Error::Mesh(format!(
                "NumberOfTriangles is {} but {} triangles are listed",
                record.number_of_triangles,
                record.triangles.len()
            )));
        }
        Ok(Mesh::new(record.triangles))
    }
}

impl From<Mesh> for MeshRecord {
    fn from(mesh: Mesh) -> Self {
        Self {
            number_of_triangles: mesh.triangle_count(),
            triangles: mesh.triangles,
        }
    }
}

/// An ordered list of triangles.
///
/// The triangle count is always the length of the list.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshRecord", into = "MeshRecord")]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a mesh from triangles in face order.
    #[inline]
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Create an empty mesh with room for `triangle_count` triangles.
    pub fn with_capacity(triangle_count: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Get the triangles.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get mutable access to the triangles.
    ///
    /// Values may change, the count may not.
    #[inline]
    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }

    /// Get a triangle by face index.
    #[inline]
    pub fn triangle(&self, idx: usize) -> Option<&Triangle> {
        self.triangles.get(idx)
    }

    /// Get the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append a triangle.
    pub fn push(&mut self, tri: Triangle) {
        self.triangles.push(tri);
    }

    /// Iterate over the triangles in face order.
    pub fn iter(&self) -> std::slice::Iter<'_, Triangle> {
        self.triangles.iter()
    }

    /// Consume the mesh and return its triangles.
    pub fn into_triangles(self) -> Vec<Triangle> {
        self.triangles
    }

    /// Whether both meshes have the same count and every float of every
    /// triangle is within `tolerance`.
    pub fn approx_eq(&self, other: &Mesh, tolerance: f32) -> bool {
        self.triangle_count() == other.triangle_count()
            && self
                .triangles
                .iter()
                .zip(&other.triangles)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// Parse a fixture record from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Json(e))
    }

    /// Serialize to a fixture JSON record.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Json(e))
    }

    /// Load a fixture record from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("triangle_count", &self.triangle_count())
            .field("triangles", &self.triangles)
            .finish()
    }
}

impl From<Vec<Triangle>> for Mesh {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::new(triangles)
    }
}

impl FromIterator<Triangle> for Mesh {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Mesh {
    type Item = &'a Triangle;
    type IntoIter = std::slice::Iter<'a, Triangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_triangle() -> Triangle {
        Triangle::new(
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        )
    }

    #[test]
    fn test_triangle_accessors() {
        let tri = sample_triangle();
        assert_eq!(tri.normal(), [0.0, 0.0, 1.0]);
        assert_eq!(tri.vertices()[1], [1.0, 0.0, 0.0]);
        assert_eq!(tri.vector(3), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_triangle_float_order() {
        let floats = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        let tri = Triangle::from_floats(floats);
        assert_eq!(tri.normal(), [1.0, 2.0, 3.0]);
        assert_eq!(tri.vector(3), [10.0, 11.0, 12.0]);
        assert_eq!(tri.to_floats(), floats);
    }

    #[test]
    fn test_triangle_approx_eq() {
        let a = sample_triangle();
        let mut b = a;
        b.vectors[2][0] += 5e-7;
        assert!(a.approx_eq(&b, 1e-6));
        b.vectors[2][0] += 1e-3;
        assert!(!a.approx_eq(&b, 1e-6));
    }

    #[test]
    fn test_mesh_count_tracks_triangles() {
        let mut mesh = Mesh::with_capacity(2);
        assert!(mesh.is_empty());
        mesh.push(sample_triangle());
        mesh.push(sample_triangle());
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.iter().count(), 2);
        assert!(mesh.triangle(2).is_none());
    }

    #[test]
    fn test_mesh_triangles_mut_and_into_triangles() {
        let mut mesh = Mesh::new(vec![sample_triangle(), sample_triangle()]);
        mesh.triangles_mut()[1].vectors[3] = [7.0, 8.0, 9.0];
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangle(0), Some(&sample_triangle()));
        assert_eq!(mesh.triangle(1).unwrap().vector(3), [7.0, 8.0, 9.0]);

        let triangles = mesh.into_triangles();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1].vertices()[2], [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_mesh_fixture_json_shape() {
        let mesh = Mesh::new(vec![sample_triangle()]);
        let json = mesh.to_json().unwrap();
        assert!(json.contains("\"NumberOfTriangles\":1"));
        assert!(json.contains("\"Triangles\":[[[0.0,0.0,1.0],[0.0,0.0,0.0]"));

        let parsed = Mesh::from_json(&json).unwrap();
        assert_eq!(parsed, mesh);
    }

    #[test]
    fn test_mesh_fixture_count_mismatch_rejected() {
        let json = r#"{"NumberOfTriangles": 2, "Triangles": [[[0,0,1],[0,0,0],[1,0,0],[0,1,0]]]}"#;
        assert!(Mesh::from_json(json).is_err());
    }
}
