//! Abstraction over a versioned remote source.
//!
//! The engine depends only on three capabilities: resolve the declared
//! version at a source URL, list the files the source exposes, and fetch one
//! file's bytes. The concrete GitHub implementation lives in
//! [`crate::github`]; tests substitute their own.

use async_trait::async_trait;

/// Kind of a remote file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// One file exposed by a remote source listing. Ephemeral, produced per
/// listing call.
#[derive(Debug, Clone)]
pub struct RemoteFileEntry {
    /// File name, relative to the source root.
    pub name: String,
    pub kind: FileKind,
    /// Opaque handle the source uses to retrieve the bytes.
    pub fetch_reference: String,
}

/// Errors from remote source operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The source URL is not recognized as belonging to the supported host
    /// family, or does not decompose into an owner/repository pair.
    #[error("unsupported source URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("undecodable payload: {0}")]
    Decode(String),
}

/// A versioned remote source of extension files.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Resolve the version declared at `source_url`.
    ///
    /// Fails closed: any network error, non-success status, malformed URL,
    /// or undecodable payload yields `None`. Absence is the only failure
    /// signal this call exposes.
    async fn resolve_version(&self, source_url: &str) -> Option<String>;

    /// List the top-level file tree at `source_url`.
    ///
    /// An error here is distinct from an empty listing, so callers can tell
    /// "nothing to update" apart from "could not check".
    async fn list_files(&self, source_url: &str) -> Result<Vec<RemoteFileEntry>, RemoteError>;

    /// Retrieve raw content for one file entry.
    async fn fetch(&self, entry: &RemoteFileEntry) -> Result<Vec<u8>, RemoteError>;
}
