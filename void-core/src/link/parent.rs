// void-core/src/link/parent.rs
//! Turns a symlinked parent of a data path back into a real directory.
//!
//! Applications call `mkdir -p` on their config parents; an existing symlink there (left
//! over from older relocation schemes or another tool) makes that fail once its target
//! disappears, so the parent is normalised before a data path is linked below it.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use void_common::error::{Result, VoidError};

use crate::fs_util::{move_path, remove_path};

/// What currently occupies the parent directory of a data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentState {
    Missing,
    RealDir,
    /// Symlink resolving to an existing directory.
    ValidSymlink(PathBuf),
    /// Dangling symlink, or one resolving to something that is not a directory.
    BrokenSymlink,
    /// A regular file (or other non-directory) sits where the directory should be.
    NotADirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Parent is already a real directory, or absent and created later by the caller.
    Untouched,
    /// A valid symlink was replaced by a real directory holding `moved` prior entries.
    Materialized { moved: usize },
    /// A broken symlink was replaced by an empty directory.
    Replaced,
}

pub fn classify_parent(parent: &Path) -> ParentState {
    let Ok(meta) = parent.symlink_metadata() else {
        return ParentState::Missing;
    };
    let file_type = meta.file_type();
    if file_type.is_dir() {
        ParentState::RealDir
    } else if file_type.is_symlink() {
        match fs::canonicalize(parent) {
            Ok(target) if target.is_dir() => ParentState::ValidSymlink(target),
            _ => ParentState::BrokenSymlink,
        }
    } else {
        ParentState::NotADirectory
    }
}

/// Makes sure the parent of `home_path` is not a symlink.
///
/// `home` bounds the operation: the home directory itself is never touched. When the
/// parent is a valid symlink its entries are moved into the new real directory, except
/// the one named like `home_path`, which is left for the caller to relink.
pub fn materialize_parent(home: &Path, home_path: &Path) -> Result<MaterializeOutcome> {
    let Some(parent) = home_path.parent() else {
        return Ok(MaterializeOutcome::Untouched);
    };
    if parent == home || !parent.starts_with(home) {
        return Ok(MaterializeOutcome::Untouched);
    }

    match classify_parent(parent) {
        ParentState::Missing | ParentState::RealDir => Ok(MaterializeOutcome::Untouched),
        ParentState::NotADirectory => Err(VoidError::LinkError {
            path: parent.to_path_buf(),
            reason: "parent exists but is not a directory".to_string(),
        }),
        ParentState::BrokenSymlink => {
            debug!(
                "Replacing broken parent symlink {} with a directory",
                parent.display()
            );
            fs::remove_file(parent)?;
            fs::create_dir_all(parent)?;
            Ok(MaterializeOutcome::Replaced)
        }
        ParentState::ValidSymlink(target) => {
            let skip = home_path.file_name();
            let staging = staging_dir_for(parent);
            remove_path(&staging)?;
            fs::create_dir_all(&staging)?;

            let mut moved = 0;
            for entry in fs::read_dir(&target)? {
                let entry = entry?;
                if Some(entry.file_name().as_os_str()) == skip {
                    continue;
                }
                move_path(&entry.path(), &staging.join(entry.file_name()))?;
                moved += 1;
            }

            fs::remove_file(parent)?;
            if let Err(e) = fs::rename(&staging, parent) {
                warn!(
                    "Failed to move materialized {} into place: {}",
                    staging.display(),
                    e
                );
                return Err(VoidError::LinkError {
                    path: parent.to_path_buf(),
                    reason: format!("could not replace symlink with directory: {e}"),
                });
            }
            debug!(
                "Materialized {} (was -> {}), moved {} entries",
                parent.display(),
                target.display(),
                moved
            );
            Ok(MaterializeOutcome::Materialized { moved })
        }
    }
}

fn staging_dir_for(parent: &Path) -> PathBuf {
    let name = parent
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    parent.with_file_name(format!(".{name}.void-materialize"))
}
