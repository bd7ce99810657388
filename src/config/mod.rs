//! Codec configuration.
//!
//! This module provides [`CodecConfig`], the tuning knobs shared by the
//! binary and ASCII codecs: batch size, worker count, the solid name written
//! to ASCII output and the ASCII facet policy.

mod codec_config;

pub use codec_config::{CodecConfig, DEFAULT_SOLID_NAME};
