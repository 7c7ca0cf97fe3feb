//! Resolver configuration.
//!
//! Controls how attribute values are fetched from a token when a typed
//! object is resolved. Stored as TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, ObjectResult};

/// How the resolver talks to an [`AttributeReader`](crate::transport::AttributeReader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Try one batch read for all scalar slots before falling back to
    /// per-attribute reads
    pub batch_reads: bool,
    /// Read attribute and mechanism arrays one at a time, outside the batch
    pub read_arrays_individually: bool,
    /// Fail resolution on malformed attribute payloads instead of marking
    /// the slot not present
    pub strict_decoding: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            batch_reads: true,
            read_arrays_individually: true,
            strict_decoding: false,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(content: &str) -> ObjectResult<Self> {
        toml::from_str(content).map_err(ObjectError::config)
    }

    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> ObjectResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(ObjectError::config)?;
        Self::from_toml_str(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ObjectResult<()> {
        let content = toml::to_string_pretty(self).map_err(ObjectError::config)?;
        fs::write(path, content).map_err(ObjectError::config)
    }
}
