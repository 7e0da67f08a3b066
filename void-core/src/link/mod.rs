// void-core/src/link/mod.rs
//! Launcher and data-directory symlinks between home and fast storage.
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::model::{AppRecord, ArchiveKind};

use crate::classify::classify;
use crate::fs_util::{entry_exists, is_real_dir, is_symlink, move_path, remove_path};

pub mod health;
pub mod parent;

use parent::materialize_parent;

/// Result of a single [`LinkManager::link_data_path`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLinkOutcome {
    /// The home path already resolved to an existing target; nothing was changed.
    AlreadyLinked,
    Linked {
        target: PathBuf,
        /// Home data was moved to fast storage.
        migrated: bool,
        /// Home data was set aside here because the target already existed.
        backup: Option<PathBuf>,
    },
}

pub struct LinkManager<'a> {
    config: &'a Config,
}

impl<'a> LinkManager<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// The app's archive kind: the catalog value, else classified from its URL.
    pub fn kind_of(&self, app: &AppRecord) -> ArchiveKind {
        classify(&app.url, app.kind)
    }

    /// The kind the app is installed as, judged from the install directory.
    ///
    /// An install-time kind override is not recorded, so when the catalog kind's binary is
    /// absent the AppImage and raw-binary layouts are tried before giving up on the
    /// catalog kind.
    pub fn installed_kind(&self, app: &AppRecord) -> ArchiveKind {
        let declared = self.kind_of(app);
        let present = |kind: ArchiveKind| {
            self.binary_path(app, kind)
                .is_some_and(|binary| binary.is_file())
        };
        if present(declared) {
            return declared;
        }
        [ArchiveKind::AppImage, ArchiveKind::RawBinary]
            .into_iter()
            .filter(|kind| *kind != declared)
            .find(|kind| present(*kind))
            .inspect(|kind| {
                debug!(
                    "{} is laid out as a {} install, not {}",
                    app.key, kind, declared
                )
            })
            .unwrap_or(declared)
    }

    /// Absolute path of the app's main executable, if one can be derived for `kind`.
    pub fn binary_path(&self, app: &AppRecord, kind: ArchiveKind) -> Option<PathBuf> {
        app.binary_rel_path(kind)
            .map(|rel| self.config.app_install_dir(&app.key).join(rel))
    }

    /// (Re)creates `<bin_dir>/<link_name> -> binary`, replacing whatever was there.
    pub fn create_launcher(&self, binary: &Path, link_name: &str) -> Result<PathBuf> {
        let launcher = self.config.launcher_path(link_name);
        fs::create_dir_all(&self.config.bin_dir)?;

        if is_real_dir(&launcher) {
            return Err(VoidError::LinkError {
                path: launcher,
                reason: "a directory occupies the launcher path".to_string(),
            });
        }
        remove_path(&launcher)?;
        symlink(binary, &launcher).map_err(|e| VoidError::LinkError {
            path: launcher.clone(),
            reason: format!("failed to create symlink to {}: {e}", binary.display()),
        })?;
        debug!("Linked {} -> {}", launcher.display(), binary.display());
        Ok(launcher)
    }

    /// Fast-storage location for a home-relative data path:
    /// `.config/discord` maps to `<data_dir>/<app>/config_discord`.
    pub fn data_target_path(&self, app_key: &str, relative_path: &str) -> Result<PathBuf> {
        validate_relative(relative_path)?;
        let flattened = relative_path.replace('/', "_");
        let name = flattened.trim_matches('.');
        if name.is_empty() {
            return Err(VoidError::ValidationError(format!(
                "Data path '{relative_path}' does not name a directory"
            )));
        }
        Ok(self.config.app_data_dir(app_key).join(name))
    }

    pub fn home_data_path(&self, relative_path: &str) -> Result<PathBuf> {
        validate_relative(relative_path)?;
        Ok(self.config.home_dir.join(relative_path))
    }

    /// Converges `~/<relative_path>` to a symlink onto its fast-storage directory.
    ///
    /// Existing home data is moved to fast storage when the target is new. When both sides
    /// already hold data, fast storage wins and the home copy is renamed to a `.bak`
    /// sibling; nothing is merged.
    pub fn link_data_path(&self, app_key: &str, relative_path: &str) -> Result<DataLinkOutcome> {
        let home_path = self.home_data_path(relative_path)?;
        let target = self.data_target_path(app_key, relative_path)?;

        materialize_parent(&self.config.home_dir, &home_path)?;

        if is_symlink(&home_path) && is_real_dir(&target) && resolves_to(&home_path, &target) {
            debug!("Data link correct: {} -> {}", home_path.display(), target.display());
            return Ok(DataLinkOutcome::AlreadyLinked);
        }

        if is_symlink(&target) {
            warn!("Removing symlink at data target {}", target.display());
            remove_path(&target)?;
        }

        let mut migrated = false;
        let mut backup = None;
        if entry_exists(&home_path) && !is_symlink(&home_path) {
            if is_real_dir(&home_path) && !entry_exists(&target) {
                info!(
                    "Moving existing data from {} to {}",
                    home_path.display(),
                    target.display()
                );
                move_path(&home_path, &target)?;
                migrated = true;
            } else {
                let backup_path = backup_path_for(&home_path);
                warn!(
                    "{} already exists. Backing up {} to {} and using fast storage",
                    target.display(),
                    home_path.display(),
                    backup_path.display()
                );
                fs::rename(&home_path, &backup_path).map_err(|e| VoidError::LinkError {
                    path: home_path.clone(),
                    reason: format!("failed to back up to {}: {e}", backup_path.display()),
                })?;
                backup = Some(backup_path);
            }
        }

        if entry_exists(&target) && !is_real_dir(&target) {
            return Err(VoidError::LinkError {
                path: target,
                reason: "data target exists but is not a directory".to_string(),
            });
        }
        fs::create_dir_all(&target)?;

        // Stale symlink or an empty directory recreated by the app.
        remove_path(&home_path)?;
        if let Some(parent) = home_path.parent() {
            fs::create_dir_all(parent)?;
        }
        symlink(&target, &home_path).map_err(|e| VoidError::LinkError {
            path: home_path.clone(),
            reason: format!("failed to create symlink to {}: {e}", target.display()),
        })?;
        info!("Linked data {} -> {}", home_path.display(), target.display());

        Ok(DataLinkOutcome::Linked {
            target,
            migrated,
            backup,
        })
    }
}

fn validate_relative(relative_path: &str) -> Result<()> {
    let path = Path::new(relative_path);
    let valid = !relative_path.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(())
    } else {
        Err(VoidError::ValidationError(format!(
            "Data path '{relative_path}' must be relative to home without '..'"
        )))
    }
}

/// True when both paths canonicalize to the same existing location.
pub(crate) fn resolves_to(link: &Path, target: &Path) -> bool {
    match (fs::canonicalize(link), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// `<name>.bak`, or `<name>.bak.<unix seconds>` when that is taken.
fn backup_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let plain = path.with_file_name(format!("{name}.bak"));
    if !entry_exists(&plain) {
        return plain;
    }
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut candidate = path.with_file_name(format!("{name}.bak.{secs}"));
    let mut n = 1;
    while entry_exists(&candidate) {
        candidate = path.with_file_name(format!("{name}.bak.{secs}.{n}"));
        n += 1;
    }
    candidate
}
