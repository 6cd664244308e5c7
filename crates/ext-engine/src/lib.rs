//! Self-update engine for installed extensions.
//!
//! An extension is a directory under a common root, described by a manifest
//! file declaring its name, version, and remote source. This crate answers
//! three questions for any extension: what version is installed, what version
//! is available remotely, and how to replace the installed files with the
//! remote ones without leaving the extension broken if the operation fails
//! partway.

pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod github;
pub mod limiter;
pub mod manifest;
pub mod prefs;
pub mod remote;
pub mod scanner;
pub mod transaction;

/// The canonical filename for extension manifest files.
///
/// Every extension directory must carry a file with this name at its root
/// for the scanner to recognize it.
pub const MANIFEST_FILENAME: &str = "_manifest.json";

/// Directory under the extensions root that hosts the updater itself.
/// Never scanned and never updated.
pub const ENGINE_DIR_NAME: &str = "updater";

/// Manifest-declared name of the bundled sample extension, excluded from
/// scans unconditionally.
pub const SAMPLE_EXTENSION_NAME: &str = "Hello World Sample Extension";

pub use config::EngineConfig;
pub use download::{Downloader, StageError, StagedDownload, default_file_filter};
pub use engine::{CheckReport, CheckStatus, UpdateEngine, UpdateOutcome, UpdateReport, UpdateTarget};
pub use error::{Error, Result};
pub use limiter::{Clock, RateLimiter, SystemClock};
pub use manifest::ExtensionManifest;
pub use prefs::PreferenceStore;
pub use remote::{FileKind, RemoteError, RemoteFileEntry, RemoteSource};
pub use scanner::ExtensionRecord;
pub use transaction::{TransactionError, UpdateTransaction};
