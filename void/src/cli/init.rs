// void/src/cli/init.rs
use std::fs;

use clap::Args;
use colored::Colorize;
use tracing::{debug, info};
use void_common::config::{Config, Profile};
use void_common::error::Result;

const DEFAULT_PROFILE_APPS: &[&str] = &["vscode", "discord", "obsidian"];

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing apps.json with the default profile.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        info!("Initializing void in {}", config.config_dir.display());

        for dir in [&config.config_dir, &config.bin_dir] {
            fs::create_dir_all(dir)?;
            debug!("Ensured directory {}", dir.display());
        }
        if let Err(e) = fs::create_dir_all(config.apps_dir()) {
            // The storage root may be a mount that only exists on some machines.
            println!(
                "{} Could not create {}: {}",
                "Warning:".yellow(),
                config.apps_dir().display(),
                e
            );
        }

        let profile_path = config.profile_file();
        if profile_path.exists() && !self.force {
            println!("Config already exists at {}", profile_path.display());
        } else {
            Profile {
                apps: DEFAULT_PROFILE_APPS.iter().map(|s| s.to_string()).collect(),
            }
            .save(config)?;
            println!("Created default config at {}", profile_path.display());
        }

        println!("{}", "Setup complete!".green().bold());
        let path_var = std::env::var("PATH").unwrap_or_default();
        if !config.bin_dir_on_path(&path_var) {
            print_path_hint(config);
        }
        Ok(())
    }
}

pub(crate) fn print_path_hint(config: &Config) {
    let bin = config.bin_dir.display();
    println!(
        "\n{} {} is not in your PATH; launchers installed by void will not be found.",
        "Warning:".yellow().bold(),
        bin
    );
    println!("Add it with:");
    println!("    echo 'export PATH=\"{bin}:$PATH\"' >> ~/.zshrc");
}
