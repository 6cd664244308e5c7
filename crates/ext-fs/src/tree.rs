//! Directory tree operations.
//!
//! The update transaction uses one primitive for both its backup and its
//! install phase: [`copy_tree`]. A copy either reaches the destination in
//! full or returns an error describing the first entry that failed; callers
//! decide whether to clean up the partial destination.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created if it does not exist. Symlinks are not followed; an
/// entry that is neither a file nor a directory is skipped with a warning.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if `src` is not a directory, or
/// [`Error::Io`] for the first entry that fails to copy. The destination
/// may hold a partial copy in that case.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        return Err(Error::NotADirectory {
            path: src.to_path_buf(),
        });
    }
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&src_path, e))?;

        if file_type.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).map_err(|e| Error::io(&src_path, e))?;
        } else {
            tracing::warn!("skipping non-regular entry during copy: {:?}", src_path);
        }
    }

    Ok(())
}

/// Remove every file and subdirectory directly under `dir`.
///
/// The directory itself is kept, so its ownership and permissions survive.
pub fn clear_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        } else {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }
    }

    Ok(())
}

/// Remove a directory tree if it exists; a missing path is not an error.
pub fn remove_tree_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}
