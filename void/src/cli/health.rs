use clap::Args;
use colored::Colorize;
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::{AppRecord, Catalog, Offline};
use void_core::{InstallState, Installer, LinkManager};

use crate::cli::finish_batch;

#[derive(Args, Debug)]
pub struct Health {
    /// Apps to check; defaults to every installed app
    #[arg(value_name = "APP")]
    pub apps: Vec<String>,
}

impl Health {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let links = LinkManager::new(config);
        let mut errors: Vec<(String, VoidError)> = Vec::new();

        let targets = if self.apps.is_empty() {
            let targets = installed_apps(config, catalog);
            if targets.is_empty() {
                println!("{}", "No installed apps to check".yellow());
                return Ok(());
            }
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

        let mut unhealthy = 0;
        for app in targets {
            let report = links.check_health(app);
            if report.ok {
                println!("✓ {} is healthy", app.key.green());
                continue;
            }
            unhealthy += 1;
            println!("✖ {} has {} issue(s):", app.key.red(), report.issues.len());
            for issue in &report.issues {
                println!("  - {issue}");
            }
        }
        if unhealthy > 0 {
            println!(
                "\n{} Run 'void repair' to fix launchers and data links.",
                "Hint:".yellow()
            );
            errors.push((
                format!("{unhealthy} app(s)"),
                VoidError::Generic("health check reported issues".to_string()),
            ));
        }
        finish_batch("health check", errors)
    }
}

/// Catalog apps with an install directory on fast storage.
pub(crate) fn installed_apps<'c>(config: &Config, catalog: &'c Catalog) -> Vec<&'c AppRecord> {
    let installer = Installer::new(config, Offline);
    catalog
        .iter()
        .filter(|app| installer.state(app, None) != InstallState::NotInstalled)
        .collect()
}
