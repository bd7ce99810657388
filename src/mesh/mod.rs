//! Mesh data model.
//!
//! This module provides the types produced by the decoders and consumed by
//! the encoders:
//! - [`Mesh`] - an ordered list of triangles
//! - [`Triangle`] - a facet normal plus three vertices
//! - [`Vector3`] - three single-precision components

mod triangle_mesh;

pub use triangle_mesh::{Mesh, Triangle, Vector3};
