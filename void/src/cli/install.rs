// void/src/cli/install.rs
use clap::Args;
use colored::Colorize;
use tracing::{debug, error, warn};
use void_common::config::{Config, Profile};
use void_common::error::{Result, VoidError};
use void_common::model::ArchiveKind;
use void_common::{AppRecord, Catalog, Downloader};
use void_core::{InstallOptions, Installer};
use void_net::HttpDownloader;

use crate::cli::init::print_path_hint;
use crate::cli::{finish_batch, parse_archive_kind};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Catalog keys of the apps to install
    #[arg(required = true, value_name = "APP")]
    pub apps: Vec<String>,

    /// Archive type, overriding both the catalog and URL detection
    #[arg(long = "type", value_name = "KIND", value_parser = parse_archive_kind)]
    pub kind: Option<ArchiveKind>,

    /// Do not create a desktop entry
    #[arg(long)]
    pub no_desktop: bool,
}

impl InstallArgs {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let options = InstallOptions {
            kind_override: self.kind,
            skip_desktop_entry: self.no_desktop,
        };
        install_batch(config, catalog, &self.apps, &options)
    }
}

#[derive(Args, Debug)]
pub struct InstallAll {}

impl InstallAll {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let profile = Profile::load(config)?;
        if profile.apps.is_empty() {
            println!("No apps configured in {}.", config.profile_file().display());
            return Ok(());
        }
        println!("Installing {} applications...", profile.apps.len());
        install_batch(config, catalog, &profile.apps, &InstallOptions::default())
    }
}

fn install_batch(
    config: &Config,
    catalog: &Catalog,
    keys: &[String],
    options: &InstallOptions,
) -> Result<()> {
    let downloader = HttpDownloader::new()?;
    let installer = Installer::new(config, &downloader);
    let mut errors: Vec<(String, VoidError)> = Vec::new();
    let mut installed_any = false;

    for key in keys {
        let app = match catalog.require(key) {
            Ok(app) => app,
            Err(e) => {
                error!("✖ {}", e);
                errors.push((key.clone(), e));
                continue;
            }
        };
        println!("Installing {}...", app.name.cyan());
        match install_one(&installer, app, options) {
            Ok(()) => installed_any = true,
            Err(e) => {
                error!("✖ Failed to install '{}': {}", key.cyan(), e);
                errors.push((key.clone(), e));
            }
        }
    }

    if installed_any {
        let path_var = std::env::var("PATH").unwrap_or_default();
        if !config.bin_dir_on_path(&path_var) {
            print_path_hint(config);
        }
    }
    finish_batch("installing", errors)
}

fn install_one<D: Downloader>(
    installer: &Installer<'_, D>,
    app: &AppRecord,
    options: &InstallOptions,
) -> Result<()> {
    let outcome = installer.install(app, options)?;
    debug!("Install outcome for {}: {:?}", app.key, outcome);

    if outcome.fresh {
        println!(
            "✓ Installed {} → {}",
            app.key.green(),
            outcome.launcher.display()
        );
    } else {
        println!(
            "✓ {} already installed, launcher refreshed at {}",
            app.key.green(),
            outcome.launcher.display()
        );
    }
    if let Some(entry) = &outcome.desktop_entry {
        println!("  Desktop entry: {}", entry.display());
    }
    for (rel, e) in &outcome.data_link_failures {
        warn!("Data path {} of {} was not linked: {}", rel, app.key, e);
    }
    if !outcome.data_link_failures.is_empty() {
        println!(
            "  {} {} data path(s) could not be linked; run 'void repair {}'",
            "Warning:".yellow(),
            outcome.data_link_failures.len(),
            app.key
        );
    }
    Ok(())
}
