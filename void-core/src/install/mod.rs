// void-core/src/install/mod.rs
//! Download, extract, locate and link: the install/uninstall life cycle of one app.
pub mod desktop;
pub mod extract;
pub mod locate;
pub mod post_install;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::fetch::Downloader;
use void_common::model::{AppRecord, ArchiveKind};
use void_net::validation::download_file_name;
use walkdir::WalkDir;

use crate::classify::classify;
use crate::fs_util::remove_path;
use crate::install::locate::{locate, ExecutableCandidate, DEFAULT_MAX_DEPTH};
use crate::link::LinkManager;

/// How many files a [`VoidError::BinaryNotFound`] lists.
const FOUND_FILES_SAMPLE: usize = 5;

/// Install state derived from the filesystem; nothing else is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    Installed,
    /// Install directory present but the expected binary is not, e.g. after an
    /// interrupted extraction.
    InstalledIncomplete,
}

impl std::fmt::Display for InstallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotInstalled => "not installed",
            Self::Installed => "installed",
            Self::InstalledIncomplete => "incomplete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Overrides both the catalog kind and URL classification.
    pub kind_override: Option<ArchiveKind>,
    pub skip_desktop_entry: bool,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub binary: PathBuf,
    pub launcher: PathBuf,
    /// False when an existing install was only relinked.
    pub fresh: bool,
    pub desktop_entry: Option<PathBuf>,
    /// Data paths that could not be linked, with the reason.
    pub data_link_failures: Vec<(String, VoidError)>,
}

/// Drives installs for one configuration. The downloader is injected so tests and the
/// inspect helper can substitute local sources.
pub struct Installer<'a, D: Downloader> {
    config: &'a Config,
    downloader: D,
}

impl<'a, D: Downloader> Installer<'a, D> {
    pub fn new(config: &'a Config, downloader: D) -> Self {
        Self { config, downloader }
    }

    fn links(&self) -> LinkManager<'a> {
        LinkManager::new(self.config)
    }

    fn resolve_kind(&self, app: &AppRecord, kind_override: Option<ArchiveKind>) -> ArchiveKind {
        classify(&app.url, kind_override.or(app.kind))
    }

    fn expected_binary(&self, app: &AppRecord, kind: ArchiveKind) -> Result<PathBuf> {
        self.links().binary_path(app, kind).ok_or_else(|| {
            VoidError::Config(format!(
                "App '{}' has no bin_path configured for a {} install",
                app.key, kind
            ))
        })
    }

    /// Kind of an existing install: the override if given, else what is on disk.
    fn installed_kind(&self, app: &AppRecord, kind_override: Option<ArchiveKind>) -> ArchiveKind {
        kind_override.unwrap_or_else(|| self.links().installed_kind(app))
    }

    pub fn state(&self, app: &AppRecord, kind_override: Option<ArchiveKind>) -> InstallState {
        let install_dir = self.config.app_install_dir(&app.key);
        if !install_dir.is_dir() {
            return InstallState::NotInstalled;
        }
        let kind = self.installed_kind(app, kind_override);
        match self.links().binary_path(app, kind) {
            Some(binary) if binary.is_file() => InstallState::Installed,
            _ => InstallState::InstalledIncomplete,
        }
    }

    pub fn install(&self, app: &AppRecord, options: &InstallOptions) -> Result<InstallOutcome> {
        let kind = self.resolve_kind(app, options.kind_override);
        let install_dir = self.config.app_install_dir(&app.key);
        let links = self.links();

        match self.state(app, options.kind_override) {
            InstallState::Installed => {
                let binary =
                    self.expected_binary(app, self.installed_kind(app, options.kind_override))?;
                info!("{} is already installed, refreshing launcher", app.key);
                let launcher = links.create_launcher(&binary, &app.link_name)?;
                let desktop_entry = self.desktop_entry(app, options);
                return Ok(InstallOutcome {
                    binary,
                    launcher,
                    fresh: false,
                    desktop_entry,
                    data_link_failures: Vec::new(),
                });
            }
            InstallState::InstalledIncomplete => {
                warn!(
                    "{} has components missing, removing {} and reinstalling",
                    app.key,
                    install_dir.display()
                );
                fs::remove_dir_all(&install_dir)?;
            }
            InstallState::NotInstalled => {}
        }

        info!("Installing {} ({})", app.key, kind);
        let binary = self.expected_binary(app, kind)?;
        self.download_and_extract(app, kind, &install_dir)?;

        if !binary.is_file() {
            let found = sample_files(&install_dir, FOUND_FILES_SAMPLE);
            error!(
                "Expected binary for {} not found at {}",
                app.key,
                binary.display()
            );
            return Err(VoidError::BinaryNotFound {
                app: app.key.clone(),
                expected: binary,
                found,
            });
        }

        if let Some(top) = unranked_binary(&install_dir, &binary) {
            warn!(
                "Configured binary {} for {} does not look executable; best candidate is {}",
                binary.display(),
                app.key,
                top.path.display()
            );
        }

        let launcher = links.create_launcher(&binary, &app.link_name)?;
        let desktop_entry = self.desktop_entry(app, options);

        let mut data_link_failures = Vec::new();
        for rel in &app.data_paths {
            if let Err(e) = links.link_data_path(&app.key, rel) {
                error!("Failed to link data path {} for {}: {}", rel, app.key, e);
                data_link_failures.push((rel.clone(), e));
            }
        }

        if !app.post_install.is_empty() {
            post_install::run_post_install_scripts(
                &app.post_install,
                &install_dir,
                &binary,
                &app.link_name,
            );
        }

        info!("Successfully installed {}", app.key);
        Ok(InstallOutcome {
            binary,
            launcher,
            fresh: true,
            desktop_entry,
            data_link_failures,
        })
    }

    fn download_and_extract(
        &self,
        app: &AppRecord,
        kind: ArchiveKind,
        install_dir: &Path,
    ) -> Result<()> {
        let staging_dir = self.config.apps_dir().join(format!(".{}.download", app.key));
        remove_path(&staging_dir)?;
        fs::create_dir_all(&staging_dir)?;

        // A raw binary keeps its staged name, so stage it under the binary's own name.
        let file_name = match kind {
            ArchiveKind::RawBinary => app
                .binary_rel_path(kind)
                .and_then(|rel| rel.file_name().map(|n| n.to_string_lossy().to_string()))
                .unwrap_or_else(|| download_file_name(&app.url)),
            _ => download_file_name(&app.url),
        };
        let staged = staging_dir.join(file_name);

        let result = self
            .downloader
            .download(&app.url, &staged)
            .and_then(|()| self.extract_into(&staged, install_dir, app, kind));

        if let Err(e) = remove_path(&staging_dir) {
            warn!("Failed to remove staging dir {}: {}", staging_dir.display(), e);
        }
        result
    }

    fn extract_into(
        &self,
        staged: &Path,
        install_dir: &Path,
        app: &AppRecord,
        kind: ArchiveKind,
    ) -> Result<()> {
        match kind {
            ArchiveKind::RawBinary => {
                // Honour nested bin_paths such as "bin/tool".
                let dest_dir = app
                    .binary_rel_path(kind)
                    .and_then(|rel| rel.parent().map(|p| install_dir.join(p)))
                    .unwrap_or_else(|| install_dir.to_path_buf());
                extract::extract_archive(staged, &dest_dir, kind)
            }
            _ => extract::extract_archive(staged, install_dir, kind),
        }
    }

    fn desktop_entry(&self, app: &AppRecord, options: &InstallOptions) -> Option<PathBuf> {
        if options.skip_desktop_entry {
            return None;
        }
        match desktop::create_desktop_entry(self.config, app, None) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not create desktop entry for {}: {}", app.key, e);
                None
            }
        }
    }

    /// Removes the launcher, the desktop entry and the install directory.
    ///
    /// Relocated data under fast storage is left alone. Returns the removed paths.
    pub fn uninstall(&self, app: &AppRecord) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        let candidates = [
            self.config.launcher_path(&app.link_name),
            self.config.desktop_entry_path(&app.key),
            self.config.app_install_dir(&app.key),
        ];
        for path in candidates {
            if remove_path(&path)? {
                debug!("Removed {}", path.display());
                removed.push(path);
            }
        }
        if removed.is_empty() {
            return Err(VoidError::NotInstalled(app.key.clone()));
        }
        info!("Uninstalled {}", app.key);
        Ok(removed)
    }
}

/// The locator's top candidate when `binary` is not among the ranked executables at all.
fn unranked_binary(install_dir: &Path, binary: &Path) -> Option<ExecutableCandidate> {
    let rel = binary.strip_prefix(install_dir).ok()?;
    let candidates = locate(install_dir, DEFAULT_MAX_DEPTH);
    if candidates.iter().any(|c| c.path == rel) {
        debug!("{} is a ranked executable candidate", rel.display());
        return None;
    }
    candidates.into_iter().next()
}

/// Up to `limit` files below `root`, relative to it, for error messages.
fn sample_files(root: &Path, limit: usize) -> Vec<String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.display().to_string())
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tempfile::TempDir;

    use super::*;

    /// Writes fixed bytes instead of downloading, counting calls.
    struct StaticDownloader {
        body: Vec<u8>,
        calls: Cell<usize>,
    }

    impl Downloader for StaticDownloader {
        fn download(&self, _url: &str, dest: &Path) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            fs::write(dest, &self.body)?;
            Ok(())
        }
    }

    fn sandbox() -> (TempDir, Config) {
        let tmp = TempDir::new().unwrap();
        let config = Config::new(tmp.path().join("root"), tmp.path().join("home"));
        (tmp, config)
    }

    fn raw_app() -> AppRecord {
        AppRecord::new(
            "jq",
            "https://example.com/jq-linux-amd64",
            Some(ArchiveKind::RawBinary),
            None,
            "jq",
        )
    }

    #[test]
    fn raw_binary_install_and_state() {
        let (_tmp, config) = sandbox();
        let downloader = StaticDownloader {
            body: b"#!/bin/sh\necho jq\n".to_vec(),
            calls: Cell::new(0),
        };
        let installer = Installer::new(&config, &downloader);
        let app = raw_app();
        assert_eq!(installer.state(&app, None), InstallState::NotInstalled);

        let outcome = installer
            .install(&app, &InstallOptions { skip_desktop_entry: true, ..Default::default() })
            .unwrap();

        assert!(outcome.fresh);
        assert_eq!(outcome.binary, config.app_install_dir("jq").join("jq"));
        assert_eq!(fs::read_link(&outcome.launcher).unwrap(), outcome.binary);
        assert_eq!(installer.state(&app, None), InstallState::Installed);
        assert!(!config.apps_dir().join(".jq.download").exists());
        assert_eq!(downloader.calls.get(), 1);
    }

    fn zip_body(files: &[&str]) -> Vec<u8> {
        use std::io::{Cursor, Write};
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"data").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn missing_binary_lists_found_files() {
        let (_tmp, config) = sandbox();
        let downloader = StaticDownloader {
            body: zip_body(&["tool/README", "tool/lib/a.so", "tool/bin/other"]),
            calls: Cell::new(0),
        };
        let installer = Installer::new(&config, &downloader);
        let app = AppRecord::new(
            "tool",
            "https://example.com/tool.zip",
            None,
            Some("tool/bin/tool"),
            "tool",
        );

        let err = installer.install(&app, &InstallOptions::default()).unwrap_err();

        match err {
            VoidError::BinaryNotFound { app, expected, found } => {
                assert_eq!(app, "tool");
                assert!(expected.ends_with("tool/bin/tool"));
                assert_eq!(found.len(), 3);
                assert!(found.contains(&"tool/bin/other".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(installer.state(&app, None), InstallState::InstalledIncomplete);
        assert!(!config.launcher_path("tool").exists());
    }

    #[test]
    fn unranked_binary_names_the_better_candidate() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, config) = sandbox();
        let install_dir = config.app_install_dir("tool");
        fs::create_dir_all(install_dir.join("bin")).unwrap();
        let exe = install_dir.join("bin/tool");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        let readme = install_dir.join("README.md");
        fs::write(&readme, "docs").unwrap();

        assert!(unranked_binary(&install_dir, &exe).is_none());
        let top = unranked_binary(&install_dir, &readme).unwrap();
        assert_eq!(top.path, PathBuf::from("bin/tool"));
    }

    #[test]
    fn override_install_is_recognised_from_its_layout() {
        let (_tmp, config) = sandbox();
        let downloader = StaticDownloader {
            body: b"#!/bin/sh\necho tool\n".to_vec(),
            calls: Cell::new(0),
        };
        let installer = Installer::new(&config, &downloader);
        // Neither the URL nor the catalog says raw binary.
        let app = AppRecord::new("tool", "https://example.com/download/latest", None, None, "tool");
        let options = InstallOptions {
            kind_override: Some(ArchiveKind::RawBinary),
            skip_desktop_entry: true,
        };

        let outcome = installer.install(&app, &options).unwrap();
        assert_eq!(outcome.binary, config.app_install_dir("tool").join("tool"));

        assert_eq!(installer.state(&app, None), InstallState::Installed);
        let links = LinkManager::new(&config);
        assert_eq!(links.installed_kind(&app), ArchiveKind::RawBinary);
        assert!(links.check_health(&app).ok);
        links.repair(&app).unwrap();

        // A plain reinstall keeps the working install.
        let again = installer
            .install(&app, &InstallOptions { skip_desktop_entry: true, ..Default::default() })
            .unwrap();
        assert!(!again.fresh);
        assert_eq!(again.binary, outcome.binary);
        assert!(again.binary.is_file());
        assert_eq!(downloader.calls.get(), 1);
    }

    #[test]
    fn incomplete_install_is_purged_and_reinstalled() {
        let (_tmp, config) = sandbox();
        let downloader = StaticDownloader {
            body: b"#!/bin/sh\n".to_vec(),
            calls: Cell::new(0),
        };
        let installer = Installer::new(&config, &downloader);
        let app = raw_app();
        let install_dir = config.app_install_dir("jq");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join("partial.tmp"), "junk").unwrap();
        assert_eq!(installer.state(&app, None), InstallState::InstalledIncomplete);

        installer.install(&app, &InstallOptions::default()).unwrap();

        assert!(!install_dir.join("partial.tmp").exists());
        assert_eq!(installer.state(&app, None), InstallState::Installed);
    }

    #[test]
    fn uninstall_of_missing_app_is_not_installed() {
        let (_tmp, config) = sandbox();
        let downloader = StaticDownloader {
            body: Vec::new(),
            calls: Cell::new(0),
        };
        let installer = Installer::new(&config, &downloader);
        assert!(matches!(
            installer.uninstall(&raw_app()),
            Err(VoidError::NotInstalled(_))
        ));
    }

    #[test]
    fn sample_is_bounded_and_relative() {
        let tmp = TempDir::new().unwrap();
        for i in 0..8 {
            fs::write(tmp.path().join(format!("f{i}")), "x").unwrap();
        }
        let sample = sample_files(tmp.path(), FOUND_FILES_SAMPLE);
        assert_eq!(sample.len(), 5);
        assert!(sample.iter().all(|s| s.starts_with('f')));
    }
}
