//! Filesystem primitives for the extension updater.
//!
//! Provides all-or-nothing tree copies, directory clearing, checksums,
//! and atomic file writes with advisory locking.

pub mod checksum;
pub mod error;
pub mod io;
pub mod tree;

pub use error::{Error, Result};
pub use tree::{clear_dir, copy_tree, remove_tree_if_exists};
