//! SHA-256 checksum utilities
//!
//! Provides the canonical checksum format (`sha256:<hex>`) used for
//! verifying that a directory's contents survived a rolled-back update.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a file's contents.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Compute a checksum over a whole directory tree.
///
/// Hashes every regular file's relative path and contents, in sorted path
/// order, so two trees with identical content sets produce identical
/// checksums regardless of directory-entry ordering.
pub fn tree_checksum(root: &Path) -> Result<String> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for rel in &files {
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        let content = std::fs::read(root.join(rel)).map_err(|e| Error::io(root.join(rel), e))?;
        hasher.update(&content);
    }
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if path.is_file() {
            let rel = path
                .strip_prefix(root)
                .expect("entry path is under root")
                .to_string_lossy()
                .replace('\\', "/");
            out.push(rel);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn file_checksum_has_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "hello world").unwrap();
        let checksum = compute_file_checksum(&path).unwrap();
        assert!(checksum.starts_with("sha256:"));
    }

    #[test]
    fn file_checksum_known_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "hello world").unwrap();
        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn tree_checksum_is_deterministic() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();

        let first = tree_checksum(dir.path()).unwrap();
        let second = tree_checksum(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tree_checksum_detects_content_change() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let before = tree_checksum(dir.path()).unwrap();

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let after = tree_checksum(dir.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn tree_checksum_detects_added_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let before = tree_checksum(dir.path()).unwrap();

        fs::write(dir.path().join("b.txt"), "b").unwrap();
        let after = tree_checksum(dir.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn identical_trees_match() {
        let left = tempdir().unwrap();
        let right = tempdir().unwrap();
        for root in [left.path(), right.path()] {
            fs::create_dir(root.join("sub")).unwrap();
            fs::write(root.join("sub/x.txt"), "same").unwrap();
            fs::write(root.join("top.txt"), "same too").unwrap();
        }
        assert_eq!(
            tree_checksum(left.path()).unwrap(),
            tree_checksum(right.path()).unwrap()
        );
    }
}
