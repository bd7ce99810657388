//! STL file loading and saving.
//!
//! This module ties the codecs together:
//! - [`sniff`] decides the [`Flavor`] of a stream from its first bytes
//! - [`binary`] and [`ascii`] decode/encode whole buffers in batches
//! - [`StlFile`] owns an opened file and its detected flavor
//! - [`write_stl`] encodes a mesh in a caller-chosen flavor

pub mod ascii;
pub mod binary;
mod detect;
pub mod tokenizer;

pub use detect::{sniff, sniff_bytes, SNIFF_LEN};

use crate::batch::BatchScheduler;
use crate::config::CodecConfig;
use crate::mesh::Mesh;
use crate::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The two STL variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// 80-byte header, u32 count, 50-byte records.
    Binary,
    /// `solid ... endsolid` keyword text.
    Ascii,
}

impl Flavor {
    /// Conventional numeric code (0 = binary, 1 = ASCII).
    pub fn code(self) -> i32 {
        match self {
            Flavor::Binary => 0,
            Flavor::Ascii => 1,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Binary => write!(f, "binary"),
            Flavor::Ascii => write!(f, "ascii"),
        }
    }
}

impl FromStr for Flavor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("binary") {
            Ok(Flavor::Binary)
        } else if s.eq_ignore_ascii_case("ascii") {
            Ok(Flavor::Ascii)
        } else {
            Err(Error::UnknownFlavor(s.to_string()))
        }
    }
}

impl TryFrom<i32> for Flavor {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Flavor::Binary),
            1 => Ok(Flavor::Ascii),
            other => Err(Error::UnknownFlavor(other.to_string())),
        }
    }
}

/// Decode a buffer of the given flavor.
pub fn decode(bytes: &[u8], flavor: Flavor, config: &CodecConfig) -> Result<Mesh> {
    config.validate()?;
    let scheduler = BatchScheduler::from_config(config)?;
    let mesh = match flavor {
        Flavor::Binary => binary::decode(bytes, &scheduler)?,
        Flavor::Ascii => ascii::decode(bytes, &scheduler, config.strict_facets)?,
    };
    tracing::info!(
        %flavor,
        bytes = bytes.len(),
        triangles = mesh.triangle_count(),
        "decoded STL"
    );
    Ok(mesh)
}

/// Sniff the flavor of a buffer, then decode it.
pub fn decode_detect(bytes: &[u8], config: &CodecConfig) -> Result<Mesh> {
    let flavor = sniff_bytes(bytes)?;
    decode(bytes, flavor, config)
}

/// Encode a mesh in the given flavor.
pub fn encode(mesh: &Mesh, flavor: Flavor, config: &CodecConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let scheduler = BatchScheduler::from_config(config)?;
    let bytes = match flavor {
        Flavor::Binary => binary::encode(mesh, &scheduler)?,
        Flavor::Ascii => ascii::encode(mesh, &config.solid_name, &scheduler)?,
    };
    tracing::info!(
        %flavor,
        bytes = bytes.len(),
        triangles = mesh.triangle_count(),
        "encoded STL"
    );
    Ok(bytes)
}

/// An opened STL file and its detected flavor.
///
/// The flavor is fixed at [`open`](StlFile::open). Call
/// [`close`](StlFile::close) to release the file.
#[derive(Debug)]
pub struct StlFile {
    path: PathBuf,
    flavor: Flavor,
    file: File,
}

impl StlFile {
    /// Open a file and classify its flavor. No triangle data is read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let flavor = sniff(&mut file)?;
        tracing::debug!(path = %path.display(), %flavor, "opened STL file");
        Ok(Self {
            path: path.to_path_buf(),
            flavor,
            file,
        })
    }

    /// The detected flavor.
    #[inline]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The path the file was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the whole file with the default config.
    pub fn read(&mut self) -> Result<Mesh> {
        self.read_with(&CodecConfig::default())
    }

    /// Decode the whole file.
    ///
    /// Reading starts from the beginning of the file, so a handle can be read
    /// more than once.
    pub fn read_with(&mut self, config: &CodecConfig) -> Result<Mesh> {
        self.file.seek(SeekFrom::Start(0))?;
        // Capacity hint only; the read below is authoritative.
        let hint = self
            .file
            .metadata()
            .ok()
            .and_then(|m| usize::try_from(m.len()).ok())
            .unwrap_or(0);
        let mut bytes = Vec::with_capacity(hint);
        self.file.read_to_end(&mut bytes)?;
        decode(&bytes, self.flavor, config)
    }

    /// Release the file.
    pub fn close(self) {
        tracing::debug!(path = %self.path.display(), "closed STL file");
        drop(self.file);
    }
}

/// Open, decode and close a file with the default config.
pub fn read_stl<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    read_stl_with(path, &CodecConfig::default())
}

/// Open, decode and close a file.
pub fn read_stl_with<P: AsRef<Path>>(path: P, config: &CodecConfig) -> Result<Mesh> {
    let mut file = StlFile::open(path)?;
    let mesh = file.read_with(config)?;
    file.close();
    Ok(mesh)
}

/// Write a mesh to `path` in the given flavor with the default config.
pub fn write_stl<P: AsRef<Path>>(path: P, flavor: Flavor, mesh: &Mesh) -> Result<()> {
    write_stl_with(path, flavor, mesh, &CodecConfig::default())
}

/// Write a mesh to `path` in the given flavor.
///
/// The destination is created or truncated. The mesh is encoded before the
/// file is touched, so an encoding failure leaves any existing file intact.
pub fn write_stl_with<P: AsRef<Path>>(
    path: P,
    flavor: Flavor,
    mesh: &Mesh,
    config: &CodecConfig,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(mesh, flavor, config)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), %flavor, bytes = bytes.len(), "wrote STL file");
    Ok(())
}
