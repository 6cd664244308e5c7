//! Typed engine configuration loaded from `config.toml`.
//!
//! Only the recognized keys exist; there is no dynamic config lookup.
//!
//! # Example TOML
//!
//! ```toml
//! root = "/opt/extensions"
//!
//! [admin]
//! allowed_ids = ["ops-team"]
//!
//! [github]
//! username = "bot"
//! token = "ghp_..."
//!
//! [rate_limit]
//! min_interval_secs = 2
//!
//! [download]
//! concurrency = 3
//! retries = 3
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Engine configuration. Every section is optional and defaulted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Root directory holding one subdirectory per extension.
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Who may trigger destructive operations. An empty allow-list means the
/// deployment is unrestricted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub allowed_ids: BTreeSet<String>,
}

/// Optional credentials for the remote host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub username: String,
    /// Bearer token attached to every remote call when non-empty.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Minimum gap between remote metadata calls, in seconds.
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Simultaneous in-flight file fetches per stage operation.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Fetch attempts per file before giving up on it.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_min_interval_secs() -> u64 {
    2
}

fn default_concurrency() -> usize {
    3
}

fn default_retries() -> u32 {
    3
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retries: default_retries(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ext_fs::Error::io(path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for a given root with everything else defaulted.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "root must point at the extensions directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `user` may trigger update/settings operations. An empty
    /// allow-list admits everyone.
    pub fn is_admin(&self, user: &str) -> bool {
        self.admin.allowed_ids.is_empty() || self.admin.allowed_ids.contains(user)
    }

    /// The configured token, if non-empty.
    pub fn token(&self) -> Option<&str> {
        if self.github.token.is_empty() {
            None
        } else {
            Some(&self.github.token)
        }
    }

    /// Minimum inter-call interval for remote metadata calls.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit.min_interval_secs)
    }
}
