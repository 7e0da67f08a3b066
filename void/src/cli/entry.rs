use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_common::{Catalog, Offline};
use void_core::install::desktop::create_desktop_entry;
use void_core::{InstallState, Installer};

#[derive(Args, Debug)]
pub struct Entry {
    /// Catalog key of the app
    #[arg(long, value_name = "APP")]
    pub app: String,

    /// Icon file (png, svg or xpm) to use for the entry
    #[arg(long, value_name = "PATH")]
    pub icon: PathBuf,
}

impl Entry {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let app = catalog.require(&self.app)?;
        if Installer::new(config, Offline).state(app, None) != InstallState::Installed {
            return Err(VoidError::NotInstalled(app.key.clone()));
        }
        if !self.icon.is_file() {
            return Err(VoidError::NotFound(format!(
                "Icon file not found at {}",
                self.icon.display()
            )));
        }
        println!(
            "Creating desktop entry for {} with icon {}...",
            app.key,
            self.icon.display()
        );
        let path = create_desktop_entry(config, app, Some(&self.icon))?;
        println!("✓ Desktop entry written to {}", path.display().to_string().green());
        Ok(())
    }
}
