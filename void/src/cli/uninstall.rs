use clap::Args;
use colored::Colorize;
use tracing::{debug, error};
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::{Catalog, Offline};
use void_core::Installer;

use crate::cli::finish_batch;

#[derive(Args, Debug)]
pub struct Uninstall {
    /// Catalog keys of the apps to uninstall
    #[arg(required = true, value_name = "APP")]
    pub apps: Vec<String>,
}

impl Uninstall {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let installer = Installer::new(config, Offline);
        let mut errors: Vec<(String, VoidError)> = Vec::new();

        for key in &self.apps {
            let result = catalog.require(key).and_then(|app| {
                println!("Uninstalling {}...", app.name);
                installer.uninstall(app)
            });
            match result {
                Ok(removed) => {
                    for path in &removed {
                        debug!("Removed {}", path.display());
                    }
                    println!(
                        "✓ Uninstalled {} ({} item(s) removed, data kept in {})",
                        key.green(),
                        removed.len(),
                        config.app_data_dir(key).display()
                    );
                }
                Err(e) => {
                    error!("✖ Failed to uninstall '{}': {}", key.cyan(), e);
                    errors.push((key.clone(), e));
                }
            }
        }
        finish_batch("uninstalling", errors)
    }
}
