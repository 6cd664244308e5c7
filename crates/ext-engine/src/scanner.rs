//! Discovery of installed extensions.
//!
//! Scans the immediate subdirectories of the extensions root for manifest
//! files. Records are rebuilt fresh on every scan and never persisted; there
//! is no cross-invocation identity.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::manifest::ExtensionManifest;
use crate::{ENGINE_DIR_NAME, MANIFEST_FILENAME, SAMPLE_EXTENSION_NAME};

/// One discovered extension.
#[derive(Debug, Clone)]
pub struct ExtensionRecord {
    /// Manifest-declared display name.
    pub name: String,
    /// Installed version, verbatim from the manifest.
    pub local_version: String,
    /// Remote source URL. Empty means not updatable.
    pub source_url: String,
    /// File name of the owning directory.
    pub directory_name: String,
    /// Directory owning this extension's files.
    pub install_path: PathBuf,
    /// Latest remote version, populated only after a resolution call.
    pub remote_version: Option<String>,
}

impl ExtensionRecord {
    /// Whether a newer version is known to be available.
    ///
    /// Derived, never stored: true only when a remote version has been
    /// resolved and differs from the local one.
    pub fn needs_update(&self) -> bool {
        self.remote_version
            .as_deref()
            .is_some_and(|remote| remote != self.local_version)
    }

    /// Whether this extension has a remote source configured at all.
    pub fn updatable(&self) -> bool {
        !self.source_url.is_empty()
    }
}

/// Scan `root` for installed extensions.
///
/// Only immediate subdirectories are considered. The updater's own directory
/// and the bundled sample extension are excluded. A directory without a
/// manifest is ignored; a directory with a malformed or unreadable manifest
/// is skipped with a warning. Entries are visited in sorted directory-name
/// order so later name lookups resolve deterministically.
///
/// # Errors
///
/// Returns [`Error::RootUnreadable`] if `root` itself cannot be enumerated.
pub fn scan(root: &Path) -> Result<Vec<ExtensionRecord>> {
    let read_dir = fs::read_dir(root).map_err(|e| Error::RootUnreadable {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut dirs: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut records = Vec::new();
    for dir in dirs {
        let directory_name = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if directory_name == ENGINE_DIR_NAME {
            continue;
        }

        let manifest_path = dir.join(MANIFEST_FILENAME);
        if !manifest_path.exists() {
            continue;
        }

        let manifest = match ExtensionManifest::from_path(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!("skipping {}: unreadable manifest: {}", directory_name, e);
                continue;
            }
        };

        if manifest.name == SAMPLE_EXTENSION_NAME {
            continue;
        }

        records.push(ExtensionRecord {
            name: manifest.name,
            local_version: manifest.version,
            source_url: manifest.repository_url,
            directory_name,
            install_path: dir,
            remote_version: None,
        });
    }

    Ok(records)
}

/// Find a record by name, case-insensitively. First match wins, in scan order.
pub fn find_by_name<'a>(
    records: &'a [ExtensionRecord],
    name: &str,
) -> Option<&'a ExtensionRecord> {
    records
        .iter()
        .find(|record| record.name.eq_ignore_ascii_case(name))
}
