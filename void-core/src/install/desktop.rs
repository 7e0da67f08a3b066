// void-core/src/install/desktop.rs
use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::model::AppRecord;
use walkdir::WalkDir;

const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];
const CUSTOM_ICON_STEM: &str = "custom_icon";
const ICON_SEARCH_DEPTH: usize = 6;

/// Writes `<desktop_dir>/<key>.desktop` pointing at the app's launcher.
///
/// A `custom_icon` is copied into the install directory first so the entry keeps working
/// after the original file is gone.
pub fn create_desktop_entry(
    config: &Config,
    app: &AppRecord,
    custom_icon: Option<&Path>,
) -> Result<PathBuf> {
    let install_dir = config.app_install_dir(&app.key);
    let icon = resolve_icon(&install_dir, app, custom_icon)?;
    let launcher = config.launcher_path(&app.link_name);

    let mut content = String::from("[Desktop Entry]\n");
    content.push_str(&format!("Name={}\n", app.name));
    content.push_str(&format!("Exec={} %U\n", launcher.display()));
    content.push_str(&format!(
        "Icon={}\n",
        icon.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
    ));
    content.push_str("Type=Application\n");
    content.push_str("Terminal=false\n");
    content.push_str("Categories=Utility;\n");

    let entry_path = config.desktop_entry_path(&app.key);
    let write = || -> std::io::Result<()> {
        fs::create_dir_all(&config.desktop_dir)?;
        fs::write(&entry_path, &content)?;
        fs::set_permissions(&entry_path, Permissions::from_mode(0o755))
    };
    write().map_err(|e| {
        VoidError::DesktopEntryError(format!(
            "Failed to write {}: {}",
            entry_path.display(),
            e
        ))
    })?;
    debug!("Wrote desktop entry {}", entry_path.display());
    Ok(entry_path)
}

fn resolve_icon(
    install_dir: &Path,
    app: &AppRecord,
    custom_icon: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(source) = custom_icon {
        if !source.is_file() {
            return Err(VoidError::DesktopEntryError(format!(
                "Icon file not found at {}",
                source.display()
            )));
        }
        let file_name = match source.extension() {
            Some(ext) => format!("{CUSTOM_ICON_STEM}.{}", ext.to_string_lossy()),
            None => CUSTOM_ICON_STEM.to_string(),
        };
        let dest = install_dir.join(file_name);
        fs::copy(source, &dest).map_err(|e| {
            VoidError::DesktopEntryError(format!(
                "Failed to copy icon {} to {}: {}",
                source.display(),
                dest.display(),
                e
            ))
        })?;
        return Ok(Some(dest));
    }

    if let Some(icon) = app.icon.as_deref() {
        let path = install_dir.join(icon);
        if path.exists() {
            return Ok(Some(path));
        }
        debug!("Catalog icon {} missing, searching the tree", path.display());
    }

    Ok(find_icon(install_dir, &[app.key.as_str(), app.link_name.as_str()]))
}

/// Best icon file under `root`, or `None`.
///
/// Prefers files whose stem matches one of `names`, then the largest resolution
/// directory (e.g. `512x512`), then scalable formats.
pub fn find_icon(root: &Path, names: &[&str]) -> Option<PathBuf> {
    let names: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    let mut best: Option<(u32, PathBuf)> = None;

    for entry in WalkDir::new(root)
        .max_depth(ICON_SEARCH_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();
        let score = if file_name == ".DirIcon" {
            // AppImage convention; usually a symlink to the real icon.
            if !path.exists() {
                continue;
            }
            50
        } else {
            if !entry.file_type().is_file() && !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
            else {
                continue;
            };
            if !ICON_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            icon_score(path, &ext, &names)
        };

        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, path.to_path_buf()));
        }
    }

    best.map(|(_, path)| path)
}

fn icon_score(path: &Path, ext: &str, names: &[String]) -> u32 {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let mut score = 1;
    if names.iter().any(|n| *n == stem) {
        score += 100;
    } else if names.iter().any(|n| !n.is_empty() && stem.contains(n.as_str())) {
        score += 40;
    }
    if stem.contains("icon") || stem.contains("logo") {
        score += 10;
    }
    if ext == "svg" {
        score += 20;
    } else if ext == "png" {
        score += 5;
    }
    score + resolution_bonus(path)
}

/// Bonus for `hicolor/<N>x<N>/...` style directories, up to 30 for 512px and above.
fn resolution_bonus(path: &Path) -> u32 {
    path.components()
        .filter_map(|c| {
            let part = c.as_os_str().to_string_lossy();
            let (w, h) = part.split_once('x')?;
            let w: u32 = w.parse().ok()?;
            let h: u32 = h.parse().ok()?;
            Some(w.min(h))
        })
        .max()
        .map(|px| (px / 16).min(30))
        .unwrap_or(0)
}
