// void-core/src/install/locate.rs
//! Heuristic ranking of the files in an extracted tree by how likely each one is the
//! application's main executable.
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

pub const DEFAULT_MAX_DEPTH: usize = 5;

const IGNORED_EXTENSIONS: &[&str] = &["txt", "md", "json", "xml", "conf", "config"];
const ENTRY_NAMES: &[&str] = &["apprun", "run", "start", "launch", "main"];
const BINARY_EXTENSIONS: &[&str] = &["bin", "exe", "appimage", "sh", "py"];
const HELPER_KEYWORDS: &[&str] = &[
    "worker",
    "helper",
    "daemon",
    "service",
    "gfx",
    "gui",
    "backend",
    "server",
    "client",
    "plugin",
    "extension",
    "launcher",
    "wrapper",
    "shim",
    "proxy",
];
const EXACT_STEMS: &[&str] = &["run", "start", "main", "app"];

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableCandidate {
    /// Path relative to the searched root.
    pub path: PathBuf,
    pub score: u32,
}

/// Ranks candidate executables below `root`, best first.
///
/// Never fails: unreadable entries are skipped and an empty list means nothing scored.
pub fn locate(root: &Path, max_depth: usize) -> Vec<ExecutableCandidate> {
    let mut candidates: Vec<ExecutableCandidate> = WalkDir::new(root)
        // Files directly in root sit at depth 1.
        .max_depth(max_depth + 1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| {
            let path = entry.path();
            if is_ignored(path) {
                return None;
            }
            // Follows symlinks; dangling ones are dropped here.
            let metadata = fs::metadata(path).ok()?;
            if !metadata.is_file() {
                return None;
            }
            let rel = path.strip_prefix(root).ok()?.to_path_buf();
            let score = score_file(&rel, metadata.permissions().mode(), metadata.len());
            (score > 0).then_some(ExecutableCandidate { path: rel, score })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
    debug!(
        "Located {} executable candidate(s) under {}",
        candidates.len(),
        root.display()
    );
    candidates
}

fn is_ignored(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with('.') {
        return true;
    }
    extension_of(path).is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}

fn parent_is_bin(rel: &Path) -> bool {
    rel.parent()
        .and_then(|p| p.file_name())
        .is_some_and(|name| name == "bin")
}

/// Scores one file. `rel` is relative to the search root; `mode` is the raw unix mode.
fn score_file(rel: &Path, mode: u32, size: u64) -> u32 {
    let name = rel
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let lower_name = name.to_ascii_lowercase();
    let ext = extension_of(rel);
    let lower_ext = ext.as_deref().map(str::to_ascii_lowercase);
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let in_bin = parent_is_bin(rel);

    let mut score: i64 = 0;

    let exec_bit = mode & 0o111 != 0;
    if exec_bit
        || matches!(ext.as_deref(), Some("sh") | Some("AppImage"))
        || name == "AppRun"
    {
        score += 10;
    }

    let looks_binary = ext.is_none()
        || ENTRY_NAMES.contains(&lower_name.as_str())
        || lower_ext
            .as_deref()
            .is_some_and(|e| BINARY_EXTENSIONS.contains(&e))
        || in_bin;
    if looks_binary {
        score += 5;
    }
    if in_bin {
        score += 8;
    }
    if ext.is_none() {
        score += 3;
    }

    score += ((size / BYTES_PER_MB) / 10).min(10) as i64;

    if HELPER_KEYWORDS.iter().any(|kw| lower_name.contains(kw)) {
        score -= 15;
    }

    let separators = stem.chars().filter(|c| *c == '-' || *c == '_').count();
    if separators == 0 {
        score += 5;
    } else if separators >= 3 {
        score -= 5;
    }

    let stem_len = stem.chars().count();
    if stem_len <= 10 {
        score += 3;
    } else if stem_len > 25 {
        score -= 3;
    }

    if EXACT_STEMS.contains(&stem.as_str()) {
        score += 5;
    }
    if stem.ends_with("sync") || stem.ends_with("app") {
        score += 2;
    }

    score.max(0) as u32
}

#[cfg(test)]
mod tests {
    use std::fs::{File, Permissions};

    use tempfile::TempDir;

    use super::*;

    fn make_file(root: &Path, rel: &str, size: u64, mode: u32) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(&path).unwrap();
        file.set_len(size).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn main_binary_outranks_helper() {
        let tmp = TempDir::new().unwrap();
        make_file(tmp.path(), "bin/app", 50 * BYTES_PER_MB, 0o755);
        make_file(tmp.path(), "bin/app-helper-daemon", 10 * BYTES_PER_MB, 0o755);
        make_file(tmp.path(), "README.md", 100, 0o644);

        let found = locate(tmp.path(), DEFAULT_MAX_DEPTH);

        assert_eq!(found[0].path, PathBuf::from("bin/app"));
        assert_eq!(found[0].score, 46);
        let helper = found
            .iter()
            .find(|c| c.path == Path::new("bin/app-helper-daemon"))
            .unwrap();
        assert_eq!(helper.score, 12);
        assert!(found[0].score > helper.score);
        assert!(found.iter().all(|c| c.path != Path::new("README.md")));
    }

    #[test]
    fn hidden_and_config_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        make_file(tmp.path(), ".hidden", 10, 0o755);
        make_file(tmp.path(), "settings.json", 10, 0o755);
        make_file(tmp.path(), "app.conf", 10, 0o755);
        make_file(tmp.path(), "AppRun", 10, 0o755);

        let found = locate(tmp.path(), DEFAULT_MAX_DEPTH);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, PathBuf::from("AppRun"));
    }

    #[test]
    fn respects_max_depth() {
        let tmp = TempDir::new().unwrap();
        make_file(tmp.path(), "a/b/c/tool", 10, 0o755);
        assert!(locate(tmp.path(), 2).is_empty());
        assert_eq!(locate(tmp.path(), 3).len(), 1);
    }

    #[test]
    fn heavily_penalised_files_are_excluded() {
        // .so: not executable, has an extension, helper keyword and long stem.
        let score = score_file(
            Path::new("lib/libchromium_gpu_service_plugin_helper.so"),
            0o644,
            0,
        );
        assert_eq!(score, 0);
    }

    #[test]
    fn exact_names_get_bonus() {
        let run = score_file(Path::new("run"), 0o755, 0);
        let other = score_file(Path::new("runner"), 0o755, 0);
        assert_eq!(run, 10 + 5 + 3 + 5 + 3 + 5);
        assert_eq!(other, 10 + 5 + 3 + 5 + 3);
    }
}
