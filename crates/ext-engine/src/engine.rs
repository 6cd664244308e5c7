//! Engine orchestration: scan → resolve → decide → transact → report.
//!
//! Every per-extension failure is converted into an outcome value; a batch
//! never aborts because one member failed. Extensions are processed in scan
//! order, one at a time, so no two transactions ever target the same
//! directory concurrently.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::download::{Downloader, default_file_filter};
use crate::error::Result;
use crate::github::GithubSource;
use crate::limiter::RateLimiter;
use crate::prefs::PreferenceStore;
use crate::remote::RemoteSource;
use crate::scanner::{self, ExtensionRecord};
use crate::transaction::{TransactionError, UpdateTransaction};

/// Per-extension result of a check pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    UpToDate,
    UpdateAvailable { local: String, remote: String },
    /// The remote version could not be determined. Retried only on the next
    /// explicit check.
    CheckFailed,
    /// No remote source configured; distinct from a failed check.
    NoSource,
    /// No scanned record matches the requested name.
    NotFound,
}

/// One extension's check result.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: String,
    pub status: CheckStatus,
}

/// What an update call should act on.
#[derive(Debug, Clone)]
pub enum UpdateTarget {
    /// Every extension currently reporting an update available.
    All,
    /// One extension, matched case-insensitively against scanned records.
    Named(String),
}

/// Per-extension result of an update attempt.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated { from: String, to: String },
    AlreadyUpToDate,
    /// No scanned record matches the requested name.
    NotFound,
    /// The extension has no remote source configured.
    NotUpdatable,
    /// The remote version could not be resolved.
    CheckFailed,
    /// Essential files could not be retrieved; nothing on disk was touched.
    StagingFailed { reason: String },
    /// Backup could not be created; nothing on disk was touched.
    BackupFailed { reason: String },
    /// The replacement failed but the pre-update state was restored.
    RolledBack { reason: String },
    /// The replacement failed and rollback failed too; the backup directory
    /// is preserved on disk for manual recovery.
    Corrupted {
        reason: String,
        rollback_error: String,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::AlreadyUpToDate)
    }

    /// The one fatal condition: on-disk state is indeterminate.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }
}

/// One extension's update result.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub name: String,
    pub outcome: UpdateOutcome,
}

/// The update engine. Holds no persistent state beyond what each scan reads
/// back from disk.
pub struct UpdateEngine {
    config: EngineConfig,
    source: Arc<dyn RemoteSource>,
    limiter: RateLimiter,
    downloader: Downloader,
}

impl UpdateEngine {
    /// Engine talking to GitHub, credentialed per the configuration.
    pub fn new(config: EngineConfig) -> Self {
        let source: Arc<dyn RemoteSource> =
            Arc::new(GithubSource::new(config.token().map(str::to_string)));
        Self::with_source(config, source)
    }

    /// Engine with an injected remote source, for tests and other backends.
    pub fn with_source(config: EngineConfig, source: Arc<dyn RemoteSource>) -> Self {
        let limiter = RateLimiter::new(config.min_interval());
        let downloader = Downloader::with_limits(
            Arc::clone(&source),
            config.download.concurrency,
            config.download.retries,
            std::time::Duration::from_secs(1),
        );
        Self {
            config,
            source,
            limiter,
            downloader,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The auto-update preference store for this engine's root.
    pub fn preferences(&self) -> PreferenceStore {
        PreferenceStore::load(PreferenceStore::default_path(&self.config.root))
    }

    /// Pure scan, no network.
    pub fn list(&self) -> Result<Vec<ExtensionRecord>> {
        scanner::scan(&self.config.root)
    }

    /// Resolve remote versions for every scanned extension, or for the named
    /// subset only. Resolution is serial behind the shared rate limiter.
    /// A requested name matching no scanned record yields a `NotFound`
    /// report rather than silently vanishing.
    pub async fn check(&self, names: Option<&[String]>) -> Result<Vec<CheckReport>> {
        let records = self.list()?;
        let mut reports = Vec::new();
        match names {
            None => {
                for record in &records {
                    reports.push(CheckReport {
                        name: record.name.clone(),
                        status: self.check_one(record).await,
                    });
                }
            }
            Some(filter) => {
                for name in filter {
                    match scanner::find_by_name(&records, name) {
                        Some(record) => reports.push(CheckReport {
                            name: record.name.clone(),
                            status: self.check_one(record).await,
                        }),
                        None => reports.push(CheckReport {
                            name: name.clone(),
                            status: CheckStatus::NotFound,
                        }),
                    }
                }
            }
        }
        Ok(reports)
    }

    /// One extension's record with its remote version resolved, or `None` if
    /// no scanned record matches `name`.
    pub async fn info(&self, name: &str) -> Result<Option<ExtensionRecord>> {
        let records = self.list()?;
        let Some(record) = scanner::find_by_name(&records, name) else {
            return Ok(None);
        };
        let mut record = record.clone();
        if record.updatable() {
            self.limiter.wait().await;
            record.remote_version = self.source.resolve_version(&record.source_url).await;
        }
        Ok(Some(record))
    }

    /// Update one named extension or everything that is stale.
    ///
    /// A named target's remote version is re-resolved immediately before
    /// acting, so a stale earlier comparison is never trusted. For `All`,
    /// a fresh check pass decides which extensions are stale; transactions
    /// then run sequentially in scan order, and one failure never aborts
    /// the batch.
    pub async fn update(&self, target: UpdateTarget) -> Result<Vec<UpdateReport>> {
        let records = self.list()?;
        match target {
            UpdateTarget::Named(name) => {
                let Some(record) = scanner::find_by_name(&records, &name) else {
                    return Ok(vec![UpdateReport {
                        name,
                        outcome: UpdateOutcome::NotFound,
                    }]);
                };
                let outcome = self.update_one(record).await;
                Ok(vec![UpdateReport {
                    name: record.name.clone(),
                    outcome,
                }])
            }
            UpdateTarget::All => {
                let mut reports = Vec::new();
                for record in &records {
                    if !record.updatable() {
                        continue;
                    }
                    self.limiter.wait().await;
                    let remote = match self.source.resolve_version(&record.source_url).await {
                        Some(remote) => remote,
                        None => {
                            reports.push(UpdateReport {
                                name: record.name.clone(),
                                outcome: UpdateOutcome::CheckFailed,
                            });
                            continue;
                        }
                    };
                    if remote == record.local_version {
                        continue;
                    }
                    reports.push(UpdateReport {
                        name: record.name.clone(),
                        outcome: self.perform_update(record, remote).await,
                    });
                }
                Ok(reports)
            }
        }
    }

    async fn check_one(&self, record: &ExtensionRecord) -> CheckStatus {
        if !record.updatable() {
            return CheckStatus::NoSource;
        }
        self.limiter.wait().await;
        match self.source.resolve_version(&record.source_url).await {
            None => CheckStatus::CheckFailed,
            Some(remote) if remote == record.local_version => CheckStatus::UpToDate,
            Some(remote) => CheckStatus::UpdateAvailable {
                local: record.local_version.clone(),
                remote,
            },
        }
    }

    async fn update_one(&self, record: &ExtensionRecord) -> UpdateOutcome {
        if !record.updatable() {
            return UpdateOutcome::NotUpdatable;
        }
        self.limiter.wait().await;
        let Some(remote) = self.source.resolve_version(&record.source_url).await else {
            return UpdateOutcome::CheckFailed;
        };
        if remote == record.local_version {
            return UpdateOutcome::AlreadyUpToDate;
        }
        self.perform_update(record, remote).await
    }

    /// Stage the remote files, then run the replacement transaction.
    /// `remote` is the already-resolved target version.
    async fn perform_update(&self, record: &ExtensionRecord, remote: String) -> UpdateOutcome {
        tracing::info!(
            "updating {} {} -> {}",
            record.name,
            record.local_version,
            remote
        );
        let staged = match self
            .downloader
            .stage(&record.source_url, default_file_filter)
            .await
        {
            Ok(staged) => staged,
            Err(e) => {
                return UpdateOutcome::StagingFailed {
                    reason: e.to_string(),
                };
            }
        };

        let transaction = UpdateTransaction::new(&record.install_path);
        match transaction.run(staged.path()) {
            Ok(()) => UpdateOutcome::Updated {
                from: record.local_version.clone(),
                to: remote,
            },
            Err(TransactionError::BackupFailed(e)) => UpdateOutcome::BackupFailed {
                reason: e.to_string(),
            },
            Err(TransactionError::RolledBack { reason }) => UpdateOutcome::RolledBack { reason },
            Err(TransactionError::Corrupted {
                reason,
                rollback_error,
            }) => {
                tracing::error!(
                    "extension {} left in indeterminate state; backup preserved at sibling path",
                    record.name
                );
                UpdateOutcome::Corrupted {
                    reason,
                    rollback_error,
                }
            }
        }
    }
}
