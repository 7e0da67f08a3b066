// void-core/src/cleanup.rs
//! Finds caches, build leftovers and logs in the home directory that are safe to delete.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::fs_util::{remove_path, tree_size};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupItem {
    pub path: PathBuf,
    pub size: u64,
    pub category: &'static str,
    pub description: &'static str,
}

/// Home-relative patterns; entries containing `*` are globbed.
const CLEANUP_PATTERNS: &[(&str, &str, &str)] = &[
    (".cache/mozilla", "Browser Cache", "Firefox cache files"),
    (".cache/google-chrome", "Browser Cache", "Chrome cache files"),
    (".cache/chromium", "Browser Cache", "Chromium cache files"),
    (".cache/brave", "Browser Cache", "Brave browser cache"),
    (".cache/librewolf", "Browser Cache", "LibreWolf cache"),
    (".cache/pip", "Python Cache", "pip cache directory"),
    (".cache/pipenv", "Python Cache", "pipenv cache"),
    (".cache/npm", "Node Cache", "npm cache directory"),
    (".cache/yarn", "Node Cache", "yarn cache directory"),
    (".cache/cargo", "Rust Cache", "Cargo build cache"),
    (".cache/go-build", "Go Cache", "Go build cache"),
    (".cache/vscode", "IDE Cache", "VSCode cache"),
    (".cache/Code", "IDE Cache", "VSCode cache (alternative)"),
    (".cache/JetBrains", "IDE Cache", "JetBrains IDEs cache"),
    (".cache/sublime-text", "IDE Cache", "Sublime Text cache"),
    (".cache/thumbnails", "System Cache", "Thumbnail cache"),
    (".cache/fontconfig", "System Cache", "Font configuration cache"),
    (".local/share/Trash", "Trash", "Trash/Recycle bin contents"),
    (".tmp", "Temporary", "Temporary files directory"),
    ("tmp", "Temporary", "Temporary files in home"),
    ("__pycache__", "Build Artifacts", "Python bytecode cache"),
    ("*.pyc", "Build Artifacts", "Python compiled files"),
    (".pytest_cache", "Build Artifacts", "pytest cache"),
    ("node_modules", "Build Artifacts", "Node.js dependencies (if not needed)"),
    ("target", "Build Artifacts", "Rust build artifacts"),
    ("dist", "Build Artifacts", "Distribution/build directories"),
    ("build", "Build Artifacts", "Build directories"),
    (".gradle", "Build Artifacts", "Gradle cache"),
    (".m2", "Build Artifacts", "Maven cache"),
    ("*.log", "Logs", "Log files"),
    (".local/share/logs", "Logs", "Application logs"),
    ("Downloads/*.deb", "Downloads", "Old .deb packages"),
    ("Downloads/*.tar.gz", "Downloads", "Old archives"),
    ("Downloads/*.zip", "Downloads", "Old zip files"),
    ("Downloads/*.AppImage", "Downloads", "Old AppImages"),
    (".cache/pacman", "Package Cache", "Pacman cache"),
    (".cache/apt", "Package Cache", "APT cache"),
];

/// Directory names collected anywhere within [`NESTED_SCAN_DEPTH`] levels of home.
const NESTED_PATTERNS: &[(&str, &str, &str)] = &[
    ("__pycache__", "Build Artifacts", "Python bytecode cache"),
    (".pytest_cache", "Build Artifacts", "pytest cache"),
    ("node_modules", "Build Artifacts", "Node.js dependencies (can be reinstalled)"),
];
const NESTED_SCAN_DEPTH: usize = 3;

pub fn find_cleanup_items(home: &Path) -> Vec<CleanupItem> {
    let mut items = Vec::new();

    for (pattern, category, description) in CLEANUP_PATTERNS {
        let matches: Vec<PathBuf> = if pattern.contains('*') {
            let full = home.join(pattern);
            match glob::glob(&full.to_string_lossy()) {
                Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
                Err(e) => {
                    warn!("Invalid cleanup pattern {}: {}", pattern, e);
                    continue;
                }
            }
        } else {
            vec![home.join(pattern)]
        };
        for path in matches {
            push_if_nonempty(&mut items, path, *category, *description);
        }
    }

    let nested_dirs = WalkDir::new(home)
        .min_depth(1)
        .max_depth(NESTED_SCAN_DEPTH + 1)
        .into_iter()
        // Do not descend into matches; they are reported whole.
        .filter_entry(|e| {
            !e.path()
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|p| NESTED_PATTERNS.iter().any(|(n, _, _)| p == *n))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir());
    for entry in nested_dirs {
        let name = entry.file_name().to_string_lossy();
        if let Some((_, category, description)) =
            NESTED_PATTERNS.iter().find(|(n, _, _)| *n == name)
        {
            push_if_nonempty(&mut items, entry.path().to_path_buf(), *category, *description);
        }
    }

    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.path.clone()));
    debug!("Found {} cleanup candidates under {}", items.len(), home.display());
    items
}

fn push_if_nonempty(
    items: &mut Vec<CleanupItem>,
    path: PathBuf,
    category: &'static str,
    description: &'static str,
) {
    if path.symlink_metadata().is_err() {
        return;
    }
    let size = tree_size(&path);
    if size > 0 {
        items.push(CleanupItem {
            path,
            size,
            category,
            description,
        });
    }
}

/// Deletes `items` (or only measures them with `dry_run`). Returns `(items_cleaned,
/// bytes_freed)`; items that cannot be removed are skipped with a warning.
pub fn cleanup_items(items: &[CleanupItem], dry_run: bool) -> (usize, u64) {
    let mut cleaned = 0;
    let mut freed = 0;
    for item in items {
        if item.path.symlink_metadata().is_err() {
            continue;
        }
        let size = tree_size(&item.path);
        if !dry_run {
            if let Err(e) = remove_path(&item.path) {
                warn!("Could not remove {}: {}", item.path.display(), e);
                continue;
            }
        }
        cleaned += 1;
        freed += size;
    }
    (cleaned, freed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn populate(home: &Path) {
        fs::create_dir_all(home.join(".cache/pip/wheels")).unwrap();
        fs::write(home.join(".cache/pip/wheels/a.whl"), vec![0u8; 2048]).unwrap();
        fs::create_dir_all(home.join(".cache/npm")).unwrap();
        fs::write(home.join("session.log"), "log line").unwrap();
        fs::create_dir_all(home.join("projects/site/node_modules/pkg")).unwrap();
        fs::write(home.join("projects/site/node_modules/pkg/index.js"), "x").unwrap();
        fs::create_dir_all(home.join("__pycache__")).unwrap();
        fs::write(home.join("__pycache__/m.pyc"), "pyc").unwrap();
    }

    #[test]
    fn finds_nonempty_items_once() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());

        let items = find_cleanup_items(tmp.path());
        let paths: Vec<_> = items.iter().map(|i| i.path.clone()).collect();

        assert!(paths.contains(&tmp.path().join(".cache/pip")));
        assert!(paths.contains(&tmp.path().join("session.log")));
        assert!(paths.contains(&tmp.path().join("projects/site/node_modules")));
        // Empty directories are not worth listing.
        assert!(!paths.contains(&tmp.path().join(".cache/npm")));
        let pycache = paths
            .iter()
            .filter(|p| **p == tmp.path().join("__pycache__"))
            .count();
        assert_eq!(pycache, 1);
    }

    #[test]
    fn dry_run_keeps_files() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());
        let items = find_cleanup_items(tmp.path());

        let (count, bytes) = cleanup_items(&items, true);
        assert_eq!(count, items.len());
        assert_eq!(bytes, items.iter().map(|i| i.size).sum::<u64>());
        assert!(tmp.path().join(".cache/pip").exists());

        let (count, _) = cleanup_items(&items, false);
        assert_eq!(count, items.len());
        assert!(!tmp.path().join(".cache/pip").exists());
        assert!(!tmp.path().join("session.log").exists());
    }
}
