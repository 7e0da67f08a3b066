// void-core/src/inspect.rs
//! Downloads an archive into a scratch directory and reports its layout, to help write
//! `bin_path` for custom apps.
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;
use void_common::error::Result;
use void_common::fetch::Downloader;
use void_common::model::{ArchiveKind, APPIMAGE_ENTRY_POINT};
use void_net::validation::download_file_name;

use crate::classify::classify;
use crate::fs_util::format_size;
use crate::install::extract::extract_archive;
use crate::install::locate::{locate, ExecutableCandidate, DEFAULT_MAX_DEPTH};

const TREE_MAX_DEPTH: usize = 3;
const TREE_MAX_LINES: usize = 50;
const TREE_MAX_CHILDREN: usize = 10;
const MAX_CANDIDATES: usize = 20;

#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub url: String,
    pub kind: ArchiveKind,
    /// Name of the single top-level directory, if the archive has one.
    pub root_dir: Option<String>,
    pub tree: Vec<String>,
    /// Ranked candidates, relative to `root_dir` when there is one.
    pub candidates: Vec<ExecutableCandidate>,
    /// Suggested `bin_path`, relative to the install directory.
    pub recommended_bin_path: Option<String>,
}

/// Downloads and extracts `url` into a temporary directory, which is removed before
/// returning.
pub fn inspect_archive<D: Downloader>(
    url: &str,
    kind_hint: Option<ArchiveKind>,
    downloader: &D,
) -> Result<InspectionReport> {
    let kind = classify(url, kind_hint);
    let scratch = tempfile::Builder::new().prefix("void_inspect_").tempdir()?;
    let archive_path = scratch.path().join(download_file_name(url));
    let extract_dir = scratch.path().join("extracted");

    downloader.download(url, &archive_path)?;
    extract_archive(&archive_path, &extract_dir, kind)?;

    let root_dir = single_root_dir(&extract_dir)?;
    let content_root = match &root_dir {
        Some(name) => extract_dir.join(name),
        None => extract_dir.clone(),
    };
    debug!("Inspecting extracted tree at {}", content_root.display());

    let tree = directory_tree(&content_root);
    let mut candidates = locate(&content_root, DEFAULT_MAX_DEPTH);
    candidates.truncate(MAX_CANDIDATES);

    let recommended_bin_path = match kind {
        ArchiveKind::AppImage => Some(APPIMAGE_ENTRY_POINT.to_string()),
        _ => candidates.first().map(|top| {
            let path = match &root_dir {
                Some(root) => Path::new(root).join(&top.path),
                None => top.path.clone(),
            };
            path.display().to_string()
        }),
    };

    Ok(InspectionReport {
        url: url.to_string(),
        kind,
        root_dir,
        tree,
        candidates,
        recommended_bin_path,
    })
}

fn single_root_dir(extract_dir: &Path) -> Result<Option<String>> {
    let entries: Vec<PathBuf> = fs::read_dir(extract_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only
            .file_name()
            .map(|n| n.to_string_lossy().to_string())),
        _ => Ok(None),
    }
}

/// Indented listing of `root`, bounded in depth, width and total lines.
pub fn directory_tree(root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    walk_tree(root, "", 0, &mut lines);
    if lines.len() >= TREE_MAX_LINES {
        lines.truncate(TREE_MAX_LINES);
        lines.push("... (truncated)".to_string());
    }
    lines
}

fn walk_tree(path: &Path, prefix: &str, depth: usize, lines: &mut Vec<String>) {
    if lines.len() >= TREE_MAX_LINES || depth > TREE_MAX_DEPTH {
        return;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());

    let Ok(meta) = fs::symlink_metadata(path) else {
        return;
    };
    if meta.is_dir() {
        lines.push(format!("{prefix}{name}/"));
        let Ok(read) = fs::read_dir(path) else {
            return;
        };
        let mut children: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        children.sort();
        children.truncate(TREE_MAX_CHILDREN);
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            let branch = if i + 1 == count { "└── " } else { "├── " };
            walk_tree(child, &format!("{prefix}{branch}"), depth + 1, lines);
            if lines.len() >= TREE_MAX_LINES {
                break;
            }
        }
    } else {
        let size = if meta.len() > 0 {
            format!(" ({})", format_size(meta.len()))
        } else {
            String::new()
        };
        let exec = if meta.permissions().mode() & 0o111 != 0 {
            " [EXEC]"
        } else {
            ""
        };
        lines.push(format!("{prefix}{name}{size}{exec}"));
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;
    use void_common::error::VoidError;

    use super::*;

    struct CopyDownloader(PathBuf);

    impl Downloader for CopyDownloader {
        fn download(&self, _url: &str, dest: &Path) -> Result<()> {
            fs::copy(&self.0, dest).map(|_| ()).map_err(VoidError::from)
        }
    }

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("tool.tar.gz");
        let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, mode) in [
            ("Tool-1.2/tool", 0o755),
            ("Tool-1.2/tool-crash-helper", 0o755),
            ("Tool-1.2/README.md", 0o644),
        ] {
            let data = b"content";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(mode);
            header.set_cksum();
            builder.append_data(&mut header, name, &data[..]).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn recommends_top_candidate_under_root_dir() {
        let tmp = TempDir::new().unwrap();
        let downloader = CopyDownloader(fixture(tmp.path()));

        let report =
            inspect_archive("https://example.com/tool.tar.gz", None, &downloader).unwrap();

        assert_eq!(report.kind, ArchiveKind::TarGz);
        assert_eq!(report.root_dir.as_deref(), Some("Tool-1.2"));
        assert_eq!(report.candidates[0].path, PathBuf::from("tool"));
        assert_eq!(report.recommended_bin_path.as_deref(), Some("Tool-1.2/tool"));
        assert_eq!(report.tree[0], "Tool-1.2/");
        assert!(report.tree.iter().any(|l| l.ends_with("tool (7B) [EXEC]")));
    }

    #[test]
    fn tree_is_bounded() {
        let tmp = TempDir::new().unwrap();
        for d in 0..8 {
            let dir = tmp.path().join(format!("d{d}"));
            fs::create_dir(&dir).unwrap();
            for f in 0..12 {
                fs::write(dir.join(format!("f{f:02}")), "").unwrap();
            }
        }

        let tree = directory_tree(tmp.path());

        assert_eq!(tree.len(), TREE_MAX_LINES + 1);
        assert_eq!(tree.last().unwrap(), "... (truncated)");
        // 10 of 12 files listed under the first directory.
        let first_dir: Vec<_> = tree.iter().skip(2).take_while(|l| !l.contains("d1/")).collect();
        assert_eq!(first_dir.len(), TREE_MAX_CHILDREN);
    }
}
