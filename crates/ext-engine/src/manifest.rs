//! Extension manifest parsing for `_manifest.json` files.
//!
//! A manifest declares an extension's display name, installed version, and
//! remote source URL. Every field is optional on disk; missing fields are
//! defaulted rather than rejected, so a sparse manifest never aborts a scan.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "name": "alpha",
//!   "version": "1.0.0",
//!   "repository_url": "https://github.com/owner/alpha"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel version for manifests that declare none.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Extension manifest loaded from `_manifest.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtensionManifest {
    /// Display name, used as the extension's identity.
    #[serde(default)]
    pub name: String,
    /// Installed version string. Opaque to the engine; compared only by
    /// equality, never parsed.
    #[serde(default = "default_version")]
    pub version: String,
    /// Remote source URL. Empty means the extension is not updatable.
    #[serde(default)]
    pub repository_url: String,
}

fn default_version() -> String {
    UNKNOWN_VERSION.to_string()
}

impl ExtensionManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a manifest from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ext_fs::Error::io(path, e))?;
        Self::from_json(&content)
    }
}
