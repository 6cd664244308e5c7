//! The backup → clear → install → commit-or-rollback transaction.
//!
//! Replacing an extension's installed directory is the only destructive
//! thing the engine does, so it follows a strict order: the full install
//! directory is copied to a sibling backup before anything is removed, and
//! the backup survives until either the new files are confirmed in place or
//! the old ones have been restored. An external process inspecting disk
//! state mid-transaction can always reconstruct the pre-update state from
//! the backup.

use std::path::{Path, PathBuf};

/// Terminal failures of one update transaction.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Backing up the installed directory failed. Nothing was touched.
    #[error("backup failed, installed files untouched: {0}")]
    BackupFailed(#[source] ext_fs::Error),

    /// Clear or install failed and the pre-update state was restored from
    /// the backup.
    #[error("update failed and was rolled back: {reason}")]
    RolledBack { reason: String },

    /// Clear or install failed and the rollback also failed. The on-disk
    /// state is indeterminate; the backup directory is preserved for manual
    /// recovery.
    #[error(
        "update failed and rollback also failed; on-disk state is indeterminate \
         (install error: {reason}; rollback error: {rollback_error})"
    )]
    Corrupted {
        reason: String,
        rollback_error: String,
    },
}

/// Sibling path used to back up an install directory during its update.
pub fn backup_path_for(install_path: &Path) -> PathBuf {
    let name = install_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extension".to_string());
    install_path.with_file_name(format!("{name}.backup"))
}

/// One extension update transaction.
///
/// The install directory and its sibling backup are exclusively owned by
/// this transaction while it runs; the engine never lets two updates target
/// the same extension concurrently.
pub struct UpdateTransaction<'a> {
    install_path: &'a Path,
    backup_path: PathBuf,
}

impl<'a> UpdateTransaction<'a> {
    pub fn new(install_path: &'a Path) -> Self {
        Self {
            install_path,
            backup_path: backup_path_for(install_path),
        }
    }

    /// Replace the install directory's contents with `staged`.
    ///
    /// Order is Backup, Clear, Install, Commit; it must never be reordered.
    /// On a Clear or Install error the backup is restored. Once past Backup
    /// the transaction runs to completion; there is no cancellation point.
    pub fn run(&self, staged: &Path) -> Result<(), TransactionError> {
        // Backup. A stale backup from a previous failed run is removed
        // first; any failure here aborts before the destructive steps.
        if let Err(e) = ext_fs::remove_tree_if_exists(&self.backup_path) {
            return Err(TransactionError::BackupFailed(e));
        }
        if let Err(e) = ext_fs::copy_tree(self.install_path, &self.backup_path) {
            // Leave no partial backup behind.
            if let Err(cleanup) = ext_fs::remove_tree_if_exists(&self.backup_path) {
                tracing::warn!("could not remove partial backup: {}", cleanup);
            }
            return Err(TransactionError::BackupFailed(e));
        }

        // Clear, then install.
        let installed = ext_fs::clear_dir(self.install_path)
            .and_then(|()| ext_fs::copy_tree(staged, self.install_path));
        if let Err(e) = installed {
            return Err(self.rollback(e.to_string()));
        }

        // Commit: the backup is no longer needed.
        if let Err(e) = ext_fs::remove_tree_if_exists(&self.backup_path) {
            tracing::warn!(
                "update succeeded but backup removal failed, leftover at {:?}: {}",
                self.backup_path,
                e
            );
        }
        Ok(())
    }

    /// Clear whatever partial state exists, then restore the backup.
    /// Best-effort: if restoration itself fails the extension is left
    /// inconsistent and the backup is kept.
    fn rollback(&self, reason: String) -> TransactionError {
        let restored = ext_fs::clear_dir(self.install_path)
            .and_then(|()| ext_fs::copy_tree(&self.backup_path, self.install_path));
        match restored {
            Ok(()) => {
                if let Err(e) = ext_fs::remove_tree_if_exists(&self.backup_path) {
                    tracing::warn!("rollback complete but backup removal failed: {}", e);
                }
                TransactionError::RolledBack { reason }
            }
            Err(rollback_error) => TransactionError::Corrupted {
                reason,
                rollback_error: rollback_error.to_string(),
            },
        }
    }
}
