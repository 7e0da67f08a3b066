// void-core/src/link/health.rs
use std::path::Path;

use tracing::{debug, error};
use void_common::error::{Result, VoidError};
use void_common::model::AppRecord;

use super::{resolves_to, LinkManager};
use crate::fs_util::{is_real_dir, is_symlink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub app: String,
    pub ok: bool,
    /// One line per failed check.
    pub issues: Vec<String>,
}

impl LinkManager<'_> {
    /// Read-only verification of binary, launcher and data links.
    pub fn check_health(&self, app: &AppRecord) -> HealthReport {
        let mut issues = Vec::new();
        let kind = self.installed_kind(app);
        let launcher = self.config().launcher_path(&app.link_name);

        match self.binary_path(app, kind) {
            None => issues.push(format!("No bin_path configured for {kind} install")),
            Some(binary) => {
                if !binary.is_file() {
                    issues.push(format!("Binary missing at {}", binary.display()));
                }
                if let Some(issue) = launcher_issue(&launcher, &binary) {
                    issues.push(issue);
                }
            }
        }

        for rel in &app.data_paths {
            let (home_path, target) = match (
                self.home_data_path(rel),
                self.data_target_path(&app.key, rel),
            ) {
                (Ok(home_path), Ok(target)) => (home_path, target),
                (Err(e), _) | (_, Err(e)) => {
                    issues.push(format!("Invalid data path '{rel}': {e}"));
                    continue;
                }
            };
            if !is_symlink(&home_path) {
                issues.push(format!("Data path {} is not a symlink", home_path.display()));
            } else if !is_real_dir(&target) {
                issues.push(format!(
                    "Data target {} for {} is missing",
                    target.display(),
                    home_path.display()
                ));
            } else if !resolves_to(&home_path, &target) {
                issues.push(format!(
                    "Data path {} does not point to {}",
                    home_path.display(),
                    target.display()
                ));
            }
        }

        debug!("Health of '{}': {} issue(s)", app.key, issues.len());
        HealthReport {
            app: app.key.clone(),
            ok: issues.is_empty(),
            issues,
        }
    }

    /// Recreates the launcher and relinks every data path of an installed app.
    ///
    /// Never downloads or extracts; an app whose install directory or binary is gone
    /// yields [`VoidError::NotInstalled`]. Every data path is attempted before failures
    /// are reported together.
    pub fn repair(&self, app: &AppRecord) -> Result<()> {
        let install_dir = self.config().app_install_dir(&app.key);
        let kind = self.installed_kind(app);
        let binary = match self.binary_path(app, kind) {
            Some(binary) if install_dir.is_dir() && binary.is_file() => binary,
            _ => return Err(VoidError::NotInstalled(app.key.clone())),
        };

        self.create_launcher(&binary, &app.link_name)?;

        let mut failures = Vec::new();
        for rel in &app.data_paths {
            if let Err(e) = self.link_data_path(&app.key, rel) {
                error!("Failed to link data path {} for {}: {}", rel, app.key, e);
                failures.push(format!("{rel}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(VoidError::LinkError {
                path: self.config().app_data_dir(&app.key),
                reason: failures.join("; "),
            })
        }
    }
}

fn launcher_issue(launcher: &Path, binary: &Path) -> Option<String> {
    if !is_symlink(launcher) {
        return Some(if launcher.symlink_metadata().is_ok() {
            format!("Launcher {} is not a symlink", launcher.display())
        } else {
            format!("Launcher {} is missing", launcher.display())
        });
    }
    if !resolves_to(launcher, binary) {
        let points_to = std::fs::read_link(launcher)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        return Some(format!(
            "Launcher {} points to {}, expected {}",
            launcher.display(),
            points_to,
            binary.display()
        ));
    }
    None
}
