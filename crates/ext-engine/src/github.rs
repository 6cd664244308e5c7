//! GitHub-backed [`RemoteSource`] using the contents API.
//!
//! A source URL must have the shape `https://github.com/{owner}/{repo}`.
//! Version resolution reads the remote `_manifest.json` through
//! `/repos/{owner}/{repo}/contents/`, which returns the file body
//! base64-encoded; file listings use the same endpoint and expose each
//! entry's `download_url` as the fetch reference.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::remote::{FileKind, RemoteError, RemoteFileEntry, RemoteSource};
use crate::MANIFEST_FILENAME;

const API_BASE: &str = "https://api.github.com";
const HOST_PREFIX: &str = "https://github.com/";
const USER_AGENT: &str = "extension-updater";

/// Metadata calls should fail fast; file bodies can be large.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote source backed by the GitHub contents API.
pub struct GithubSource {
    client: reqwest::Client,
    token: Option<String>,
}

/// Response shape for a single-file contents request.
#[derive(Debug, Deserialize)]
struct ContentsFile {
    #[serde(default)]
    content: String,
}

/// Response shape for a directory contents listing.
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

impl GithubSource {
    /// Create a source. A token, when present, is attached to every call;
    /// its absence only lowers the caller's rate ceiling.
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Decompose `https://github.com/{owner}/{repo}` into `"owner/repo"`.
    fn repo_slug(source_url: &str) -> Result<String, RemoteError> {
        let rest = source_url
            .strip_prefix(HOST_PREFIX)
            .ok_or_else(|| RemoteError::InvalidUrl(source_url.to_string()))?;
        let rest = rest.trim_matches('/');

        let parts: Vec<&str> = rest.split('/').collect();
        match parts.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Ok(format!("{owner}/{repo}"))
            }
            _ => Err(RemoteError::InvalidUrl(source_url.to_string())),
        }
    }

    fn get(&self, url: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .timeout(timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        request
    }

    async fn send(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, RemoteError> {
        let response = self.get(url, timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn fetch_remote_version(&self, source_url: &str) -> Result<String, RemoteError> {
        let slug = Self::repo_slug(source_url)?;
        let url = format!("{API_BASE}/repos/{slug}/contents/{MANIFEST_FILENAME}");
        let body: ContentsFile = self.send(&url, METADATA_TIMEOUT).await?.json().await?;

        let manifest = decode_base64_json(&body.content)?;
        manifest
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Decode("remote manifest has no version field".into()))
    }
}

fn map_entry(entry: ContentsEntry) -> Option<RemoteFileEntry> {
    let kind = match entry.kind.as_str() {
        "file" => FileKind::File,
        "dir" => FileKind::Directory,
        // Submodules, symlinks: nothing we can stage.
        _ => return None,
    };
    Some(RemoteFileEntry {
        name: entry.name,
        kind,
        fetch_reference: entry.download_url.unwrap_or_default(),
    })
}

/// Decode a base64 contents-API payload into JSON. GitHub inserts newlines
/// into the base64 body, which must be stripped before decoding.
fn decode_base64_json(content: &str) -> Result<serde_json::Value, RemoteError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl RemoteSource for GithubSource {
    async fn resolve_version(&self, source_url: &str) -> Option<String> {
        match self.fetch_remote_version(source_url).await {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::debug!("version resolution failed for {}: {}", source_url, e);
                None
            }
        }
    }

    async fn list_files(&self, source_url: &str) -> Result<Vec<RemoteFileEntry>, RemoteError> {
        let slug = Self::repo_slug(source_url)?;
        let url = format!("{API_BASE}/repos/{slug}/contents/");
        let entries: Vec<ContentsEntry> = self.send(&url, METADATA_TIMEOUT).await?.json().await?;

        Ok(entries.into_iter().filter_map(map_entry).collect())
    }

    async fn fetch(&self, entry: &RemoteFileEntry) -> Result<Vec<u8>, RemoteError> {
        let response = self.send(&entry.fetch_reference, FETCH_TIMEOUT).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
