use clap::Args;
use colored::Colorize;
use tracing::error;
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::Catalog;
use void_core::LinkManager;

use crate::cli::finish_batch;
use crate::cli::health::installed_apps;

#[derive(Args, Debug)]
pub struct Repair {
    /// Apps to repair; defaults to every installed app
    #[arg(value_name = "APP")]
    pub apps: Vec<String>,
}

impl Repair {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let links = LinkManager::new(config);
        let mut errors: Vec<(String, VoidError)> = Vec::new();

        let targets = if self.apps.is_empty() {
            let targets = installed_apps(config, catalog);
            if targets.is_empty() {
                println!("{}", "No installed apps to repair".yellow());
                return Ok(());
            }
            println!("Repairing {} installed app(s)...", targets.len());
            targets
        } else {
            let mut targets = Vec::new();
            for key in &self.apps {
                match catalog.require(key) {
                    Ok(app) => targets.push(app),
                    Err(e) => errors.push((key.clone(), e)),
                }
            }
            targets
        };

        for app in targets {
            match links.repair(app) {
                Ok(()) => println!("✓ Repaired {}", app.key.green()),
                Err(e) => {
                    error!("✖ Failed to repair '{}': {}", app.key.cyan(), e);
                    errors.push((app.key.clone(), e));
                }
            }
        }
        finish_batch("repairing", errors)
    }
}
