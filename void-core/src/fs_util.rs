// void-core/src/fs_util.rs
//! Small filesystem primitives shared by extraction, linking and uninstall.
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use void_common::error::{Result, VoidError};
use walkdir::WalkDir;

/// Checks if a path exists without following symlinks.
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// True for a symlink, dangling or not.
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// True only for a real directory (a symlink to a directory does not count).
pub fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

pub fn set_executable(path: &Path) -> Result<()> {
    debug!("Setting permissions on {}: 755", path.display());
    fs::set_permissions(path, Permissions::from_mode(0o755)).map_err(|e| {
        error!("Failed set permissions on {}: {}", path.display(), e);
        VoidError::from(e)
    })
}

/// Removes a file, symlink or directory tree without following symlinks.
///
/// Returns `Ok(false)` when nothing was there.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    match path.symlink_metadata() {
        Ok(metadata) => {
            let file_type = metadata.file_type();
            debug!(
                "Removing {} at: {}",
                if file_type.is_dir() {
                    "directory"
                } else if file_type.is_symlink() {
                    "symlink"
                } else {
                    "file"
                },
                path.display()
            );
            // Symlinks to directories are removed with remove_file.
            let result = if file_type.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            match result {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => {
                    error!("Failed to remove {}: {}", path.display(), e);
                    Err(e)
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Moves a file, symlink or directory tree, copying across filesystems when a rename is
/// not possible.
///
/// `to` must not exist yet. The copy is assembled in a hidden sibling of `to` and renamed
/// into place; `from` is only removed once the whole tree has been copied.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    debug!("Moving {} -> {}", from.display(), to.display());
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    let rename_err = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    // Home and fast storage usually sit on different filesystems.
    debug!(
        "rename {} -> {} failed ({}), falling back to copy+remove",
        from.display(),
        to.display(),
        rename_err
    );

    let staging = copy_staging_path(to);
    remove_path(&staging)?;
    if let Err(e) = copy_tree(from, &staging) {
        warn!("Failed to copy {} to {}: {}", from.display(), staging.display(), e);
        if let Err(cleanup_err) = remove_path(&staging) {
            warn!(
                "Failed to remove partial copy {}: {}",
                staging.display(),
                cleanup_err
            );
        }
        return Err(VoidError::Generic(format!(
            "Failed to move {} to {}: {}",
            from.display(),
            to.display(),
            e
        )));
    }
    fs::rename(&staging, to)?;
    remove_path(from)?;
    Ok(())
}

fn copy_staging_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}.void-copy"))
}

/// Recursively copies `from` to `to` without following symlinks.
///
/// Symlinks are recreated with their original (possibly relative or dangling) targets.
/// Files and directories keep their permission bits.
pub fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let root_meta = from.symlink_metadata()?;
    if root_meta.file_type().is_symlink() {
        return symlink(fs::read_link(from)?, to);
    }

    // Directory modes are applied last so read-only directories can still be filled.
    let mut dir_modes = Vec::new();
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let dest = if rel.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(rel)
        };
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
            dir_modes.push((dest, entry.metadata()?.permissions()));
        } else if file_type.is_symlink() {
            symlink(fs::read_link(entry.path())?, &dest)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dest)?;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }
    for (dir, permissions) in dir_modes.into_iter().rev() {
        fs::set_permissions(&dir, permissions)?;
    }
    Ok(())
}

/// Total byte size of regular files below `path` (symlinks are not followed).
pub fn tree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|m| m.len())
        .sum()
}

pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if size >= GB {
        format!("{:.1}GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1}MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}KB", size as f64 / KB as f64)
    } else {
        format!("{size}B")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn remove_path_does_not_follow_symlinks() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("keep.txt"), "x").unwrap();
        let link = tmp.path().join("link");
        symlink(&real, &link).unwrap();

        assert!(remove_path(&link).unwrap());
        assert!(real.join("keep.txt").exists());
        assert!(!remove_path(&link).unwrap());
    }

    #[test]
    fn move_path_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("a");
        fs::create_dir(&from).unwrap();
        fs::write(from.join("f"), "data").unwrap();
        let to = tmp.path().join("x/y/b");

        move_path(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(to.join("f")).unwrap(), "data");
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("extensions/ext-1")).unwrap();
        fs::write(root.join("extensions/ext-1/package.json"), "{}").unwrap();
        fs::write(root.join("settings.json"), "{\"theme\":\"dark\"}").unwrap();
        fs::set_permissions(root.join("settings.json"), Permissions::from_mode(0o600)).unwrap();
        // Electron-style lock pointing at a host/pid pair that never exists as a file.
        symlink("myhost-12345", root.join("SingletonLock")).unwrap();
        symlink("extensions/ext-1", root.join("current")).unwrap();
    }

    fn assert_sample_tree(root: &Path) {
        assert_eq!(
            fs::read_to_string(root.join("settings.json")).unwrap(),
            "{\"theme\":\"dark\"}"
        );
        let mode = fs::metadata(root.join("settings.json")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(is_symlink(&root.join("SingletonLock")));
        assert_eq!(
            fs::read_link(root.join("SingletonLock")).unwrap(),
            PathBuf::from("myhost-12345")
        );
        assert!(is_symlink(&root.join("current")));
        assert_eq!(
            fs::read_link(root.join("current")).unwrap(),
            PathBuf::from("extensions/ext-1")
        );
        assert!(root.join("current/package.json").is_file());
    }

    #[test]
    fn copy_tree_keeps_symlinks_as_links() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("from");
        sample_tree(&from);
        let to = tmp.path().join("to");

        copy_tree(&from, &to).unwrap();

        assert_sample_tree(&to);
        assert_sample_tree(&from);
    }

    /// A scratch directory on a different filesystem than the default temp dir, if the
    /// machine has one.
    fn other_filesystem_dir() -> Option<TempDir> {
        use std::os::unix::fs::MetadataExt;
        let shm = Path::new("/dev/shm");
        let shm_dev = fs::metadata(shm).ok()?.dev();
        let tmp_dev = fs::metadata(std::env::temp_dir()).ok()?.dev();
        if shm_dev == tmp_dev {
            return None;
        }
        tempfile::Builder::new().prefix("void-test").tempdir_in(shm).ok()
    }

    #[test]
    fn move_path_across_filesystems_keeps_links() {
        let Some(other) = other_filesystem_dir() else {
            eprintln!("no second filesystem available, skipping");
            return;
        };
        let tmp = TempDir::new().unwrap();
        let from = other.path().join("discord");
        sample_tree(&from);
        let to = tmp.path().join("data/discord/config_discord");

        move_path(&from, &to).unwrap();

        assert!(!entry_exists(&from));
        assert_sample_tree(&to);
        assert!(!entry_exists(&copy_staging_path(&to)));
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2048), "2.0KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
    }
}
