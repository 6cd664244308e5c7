//! Staged, retried, bounded-concurrency file retrieval.
//!
//! `stage` fetches a filtered subset of a remote listing into an isolated
//! temporary directory. Each file is fetched with independent retries; a
//! file that exhausts its retries is simply absent from the staging area.
//! The stage as a whole only fails when listing fails, or when none of the
//! essential files made it down.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::remote::{FileKind, RemoteError, RemoteFileEntry, RemoteSource};

/// Files whose presence makes a staged download usable.
pub const ESSENTIAL_FILES: &[&str] = &["_manifest.json", "plugin.py"];

/// Extensions accepted by the default filter, to keep an update from pulling
/// arbitrary large assets out of a source tree.
const STAGED_EXTENSIONS: &[&str] = &[
    "py", "json", "toml", "md", "txt", "cfg", "yml", "yaml",
];

const DEFAULT_CONCURRENCY: usize = 3;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Whether a file name is in the essential set.
pub fn is_essential(name: &str) -> bool {
    ESSENTIAL_FILES.contains(&name)
}

/// Default staging filter: essential filenames plus source-code and
/// manifest-like extensions.
pub fn default_file_filter(entry: &RemoteFileEntry) -> bool {
    if is_essential(&entry.name) {
        return true;
    }
    Path::new(&entry.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| STAGED_EXTENSIONS.contains(&ext))
}

/// Errors from a stage operation.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The remote listing itself failed; distinct from an empty source.
    #[error("failed to list remote files: {0}")]
    ListFailed(#[source] RemoteError),

    /// The staging directory could not be created.
    #[error("failed to create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    /// All fetches settled but no essential file was staged.
    #[error("no essential file was staged")]
    NoEssentialFiles,
}

/// A completed staged download. Owns its directory; dropping it deletes the
/// staged files.
#[derive(Debug)]
pub struct StagedDownload {
    dir: TempDir,
    files: Vec<String>,
}

impl StagedDownload {
    /// Path of the staging directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Names of the files that were actually staged, sorted.
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

/// Fetches remote file subsets into staging directories.
pub struct Downloader {
    source: Arc<dyn RemoteSource>,
    concurrency: usize,
    retries: u32,
    retry_delay: Duration,
}

impl Downloader {
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        Self::with_limits(source, DEFAULT_CONCURRENCY, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
    }

    pub fn with_limits(
        source: Arc<dyn RemoteSource>,
        concurrency: usize,
        retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
            retries: retries.max(1),
            retry_delay,
        }
    }

    /// Fetch the files at `source_url` accepted by `filter` into a fresh
    /// staging directory.
    ///
    /// At most `concurrency` fetches are in flight at once; retries of one
    /// file never block progress on others. Ownership of the staging
    /// directory transfers to the caller via the returned [`StagedDownload`].
    pub async fn stage(
        &self,
        source_url: &str,
        filter: impl Fn(&RemoteFileEntry) -> bool,
    ) -> Result<StagedDownload, StageError> {
        let entries = self
            .source
            .list_files(source_url)
            .await
            .map_err(StageError::ListFailed)?;

        let dir = tempfile::tempdir().map_err(StageError::Staging)?;

        let selected: Vec<RemoteFileEntry> = entries
            .into_iter()
            .filter(|entry| entry.kind == FileKind::File)
            .filter(|entry| {
                // A listing entry name that looks like a path could escape
                // the staging directory; never stage it.
                if entry.name.contains('/') || entry.name.contains('\\') {
                    tracing::warn!("refusing to stage entry with path separator: {}", entry.name);
                    return false;
                }
                filter(entry)
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for entry in selected {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let dest: PathBuf = dir.path().join(&entry.name);
            let retries = self.retries;
            let retry_delay = self.retry_delay;
            tasks.spawn(async move {
                fetch_with_retry(
                    source.as_ref(),
                    semaphore.as_ref(),
                    &entry,
                    &dest,
                    retries,
                    retry_delay,
                )
                .await
            });
        }

        let mut files = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(name)) => files.push(name),
                Ok(None) => {}
                Err(e) => tracing::warn!("download task failed to run: {}", e),
            }
        }

        if !files.iter().any(|name| is_essential(name)) {
            return Err(StageError::NoEssentialFiles);
        }

        files.sort();
        Ok(StagedDownload { dir, files })
    }
}

/// Fetch one entry with a fixed-delay retry policy. Returns the staged file
/// name, or `None` once retries are exhausted.
///
/// A pool slot is held only while a request is in flight. The inter-retry
/// sleep happens with the permit released, so a failing file never blocks
/// files still waiting for a slot.
async fn fetch_with_retry(
    source: &dyn RemoteSource,
    semaphore: &Semaphore,
    entry: &RemoteFileEntry,
    dest: &Path,
    retries: u32,
    retry_delay: Duration,
) -> Option<String> {
    for attempt in 1..=retries {
        let result = {
            let _permit = semaphore
                .acquire()
                .await
                .expect("staging semaphore is never closed");
            source.fetch(entry).await
        };
        match result {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(dest, &bytes) {
                    tracing::warn!("failed to write staged file {}: {}", entry.name, e);
                    return None;
                }
                return Some(entry.name.clone());
            }
            Err(e) => {
                tracing::warn!(
                    "fetch attempt {}/{} failed for {}: {}",
                    attempt,
                    retries,
                    entry.name,
                    e
                );
                if attempt < retries {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
    None
}
