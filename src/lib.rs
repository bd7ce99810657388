//! # stlcodec
//!
//! Decoding and encoding of STL triangle meshes in both of the format's
//! flavors (binary and ASCII).
//!
//! A decoded [`Mesh`] is an ordered list of [`Triangle`]s, each holding a
//! facet normal followed by three vertices. Face order is preserved exactly
//! through decode/encode round trips.
//!
//! Large meshes are split into fixed-size batches that are decoded or encoded
//! on a rayon worker pool (see [`batch`]). Every batch writes into its own
//! disjoint slice of the output, so results never depend on task completion
//! order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use stlcodec::{Flavor, StlFile};
//!
//! let mut file = StlFile::open("part.stl")?;
//! let mesh = file.read()?;
//! file.close();
//!
//! stlcodec::write_stl("part_ascii.stl", Flavor::Ascii, &mesh)?;
//! ```

pub mod batch;
pub mod config;
pub mod mesh;
pub mod stl;

pub use batch::{batch_ranges, BatchErrors, BatchFailure, BatchScheduler, DEFAULT_BATCH_SIZE};
pub use config::CodecConfig;
pub use mesh::{Mesh, Triangle, Vector3};
pub use stl::{
    decode, decode_detect, encode, read_stl, read_stl_with, sniff, sniff_bytes, write_stl,
    write_stl_with, Flavor, StlFile,
};

use thiserror::Error;

/// Errors produced by the STL codecs and their supporting machinery.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying I/O failure, including files too short to classify.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A flavor value that is neither binary nor ASCII.
    #[error("Unknown STL flavor \"{0}\"")]
    UnknownFlavor(String),

    /// Invalid codec configuration.
    #[error("Invalid codec configuration: {0}")]
    Config(String),

    /// JSON (de)serialization failure for configs and fixture records.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid mesh data.
    #[error("Mesh error: {0}")]
    Mesh(String),

    /// An ASCII facet rejected under strict facet parsing.
    #[error("Facet {index}: {reason}")]
    Facet { index: usize, reason: String },

    /// Text formatting failure while building ASCII output.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A batch task panicked.
    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    /// One or more batches of a scheduler call failed.
    #[error(transparent)]
    Batch(#[from] BatchErrors),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
