use std::path::PathBuf;

/// Errors that can occur at the engine call level.
///
/// Per-extension failures (a version check that could not complete, a
/// rolled-back transaction) are reported as outcome values, not as these
/// errors; only engine misuse or an unusable environment surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse an extension manifest.
    #[error("failed to parse extension manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// Extension manifest file not found at the expected path.
    #[error("extension manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// The extensions root directory could not be read.
    #[error("failed to read extensions root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the engine configuration file.
    #[error("failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] ext_fs::Error),

    /// I/O error reading or writing engine files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
