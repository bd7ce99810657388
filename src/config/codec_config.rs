//! Codec configuration type.

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Solid name written to the `solid`/`endsolid` lines of ASCII output.
pub const DEFAULT_SOLID_NAME: &str = "Exported from stlcodec";

/// Settings shared by every codec entry point.
///
/// Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Triangles per batch task.
    pub batch_size: usize,

    /// Worker threads. `None` runs batches on rayon's global pool.
    pub threads: Option<usize>,

    /// Name used in the ASCII header and footer lines.
    pub solid_name: String,

    /// Reject ASCII facets that yield fewer than 12 numbers instead of
    /// leaving the missing slots at 0.0.
    pub strict_facets: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threads: None,
            solid_name: DEFAULT_SOLID_NAME.to_string(),
            strict_facets: false,
        }
    }
}

impl CodecConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Set the ASCII solid name.
    pub fn with_solid_name(mut self, name: impl Into<String>) -> Self {
        self.solid_name = name.into();
        self
    }

    /// Enable or disable strict ASCII facet parsing.
    pub fn with_strict_facets(mut self, strict: bool) -> Self {
        self.strict_facets = strict;
        self
    }

    /// Check the settings for values the codecs cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than zero".into()));
        }
        if self.threads == Some(0) {
            return Err(Error::Config("threads must be greater than zero".into()));
        }
        if self.solid_name.contains(['\n', '\r']) {
            return Err(Error::Config(
                "solid_name must fit on a single line".into(),
            ));
        }
        // The header line is scanned together with the first facet.
        if self.solid_name.contains("endfacet") {
            return Err(Error::Config(
                "solid_name must not contain \"endfacet\"".into(),
            ));
        }
        if let Some(word) = self
            .solid_name
            .split_whitespace()
            .find(|word| word.parse::<f32>().is_ok())
        {
            return Err(Error::Config(format!(
                "solid_name must not contain numeric words, found \"{}\"",
                word
            )));
        }
        Ok(())
    }

    /// Load a config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Json(e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Json(e))
    }

    /// Save to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_config_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.batch_size, 10_000);
        assert!(config.threads.is_none());
        assert_eq!(config.solid_name, DEFAULT_SOLID_NAME);
        assert!(!config.strict_facets);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_codec_config_serialization() {
        let config = CodecConfig::new()
            .with_batch_size(256)
            .with_threads(Some(4))
            .with_solid_name("part");

        let json = config.to_json().unwrap();
        assert!(json.contains("\"batch_size\": 256"));
        assert!(json.contains("part"));

        let parsed = CodecConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_codec_config_partial_json() {
        let config = CodecConfig::from_json(r#"{ "strict_facets": true }"#).unwrap();
        assert!(config.strict_facets);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_codec_config_validation() {
        assert!(CodecConfig::new().with_batch_size(0).validate().is_err());
        assert!(CodecConfig::new().with_threads(Some(0)).validate().is_err());
        assert!(CodecConfig::new()
            .with_solid_name("two\nlines")
            .validate()
            .is_err());
        assert!(CodecConfig::from_json(r#"{ "batch_size": 0 }"#).is_err());
    }

    #[test]
    fn test_codec_config_solid_name_must_not_leak_into_facets() {
        for name in ["part 7", "inf", "mesh -1.5e3 v2", "endfacet", "my_endfacet_part"] {
            assert!(
                matches!(
                    CodecConfig::new().with_solid_name(name).validate(),
                    Err(Error::Config(_))
                ),
                "{}",
                name
            );
        }
        for name in ["part seven", "v2 bracket", "", DEFAULT_SOLID_NAME] {
            assert!(
                CodecConfig::new().with_solid_name(name).validate().is_ok(),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_codec_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codec.json");

        let config = CodecConfig::new().with_strict_facets(true);
        config.save_to_file(&path).unwrap();

        let loaded = CodecConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
