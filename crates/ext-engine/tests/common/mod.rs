//! Shared test support: an in-memory remote source.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use async_trait::async_trait;
use ext_engine::{FileKind, RemoteError, RemoteFileEntry, RemoteSource};

/// One fake repository behind a source URL.
#[derive(Default)]
pub struct FakeRepo {
    pub version: Option<String>,
    pub files: Vec<(String, Vec<u8>)>,
    pub fail_listing: bool,
    /// File names that fail every fetch attempt with a 500.
    pub failing_files: HashSet<String>,
}

impl FakeRepo {
    pub fn with_version(version: &str) -> Self {
        Self {
            version: Some(version.to_string()),
            ..Self::default()
        }
    }

    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.files.push((name.to_string(), content.to_vec()));
        self
    }

    pub fn failing_file(mut self, name: &str) -> Self {
        self.files.push((name.to_string(), Vec::new()));
        self.failing_files.insert(name.to_string());
        self
    }
}

/// In-memory [`RemoteSource`] keyed by source URL. Also tracks how many
/// fetches were in flight simultaneously and when each fetch started.
#[derive(Default)]
pub struct FakeRemoteSource {
    repos: HashMap<String, FakeRepo>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetch_starts: Mutex<Vec<(String, Instant)>>,
}

impl FakeRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, source_url: &str, repo: FakeRepo) -> Self {
        self.repos.insert(source_url.to_string(), repo);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// When the first fetch attempt for `name` started.
    pub fn first_fetch_start(&self, name: &str) -> Option<Instant> {
        self.fetch_starts
            .lock()
            .unwrap()
            .iter()
            .find(|(fetched, _)| fetched == name)
            .map(|(_, started)| *started)
    }

    fn repo(&self, source_url: &str) -> Result<&FakeRepo, RemoteError> {
        self.repos
            .get(source_url)
            .ok_or_else(|| RemoteError::InvalidUrl(source_url.to_string()))
    }
}

#[async_trait]
impl RemoteSource for FakeRemoteSource {
    async fn resolve_version(&self, source_url: &str) -> Option<String> {
        self.repos.get(source_url).and_then(|repo| repo.version.clone())
    }

    async fn list_files(&self, source_url: &str) -> Result<Vec<RemoteFileEntry>, RemoteError> {
        let repo = self.repo(source_url)?;
        if repo.fail_listing {
            return Err(RemoteError::Status {
                status: 500,
                url: source_url.to_string(),
            });
        }
        Ok(repo
            .files
            .iter()
            .map(|(name, _)| RemoteFileEntry {
                name: name.clone(),
                kind: FileKind::File,
                fetch_reference: format!("{source_url}#{name}"),
            })
            .collect())
    }

    async fn fetch(&self, entry: &RemoteFileEntry) -> Result<Vec<u8>, RemoteError> {
        self.fetch_starts
            .lock()
            .unwrap()
            .push((entry.name.clone(), Instant::now()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        // Hold the slot briefly so overlapping fetches are observable.
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let (url, name) = entry
            .fetch_reference
            .split_once('#')
            .ok_or_else(|| RemoteError::Decode("bad fetch reference".to_string()))?;
        let repo = self.repo(url)?;
        if repo.failing_files.contains(name) {
            return Err(RemoteError::Status {
                status: 500,
                url: entry.fetch_reference.clone(),
            });
        }
        repo.files
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                url: entry.fetch_reference.clone(),
            })
    }
}
