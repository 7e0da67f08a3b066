// void/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use void_common::error::{Result, VoidError};
use void_common::model::ArchiveKind;
use void_common::{Catalog, Config};

pub mod clean;
pub mod entry;
pub mod health;
pub mod init;
pub mod inspect;
pub mod install;
pub mod list;
pub mod repair;
pub mod uninstall;

use crate::cli::clean::Clean;
use crate::cli::entry::Entry;
use crate::cli::health::Health;
pub use crate::cli::init::InitArgs;
use crate::cli::inspect::Inspect;
use crate::cli::install::{InstallAll, InstallArgs};
use crate::cli::list::List;
use crate::cli::repair::Repair;
use crate::cli::uninstall::Uninstall;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "void", bin_name = "void")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the config directory, launcher directory and a default profile
    Init(InitArgs),
    /// List catalog apps and their install state
    List(List),
    /// Install one or more apps
    Install(InstallArgs),
    /// Install every app in the profile (apps.json)
    InstallAll(InstallAll),
    /// Remove apps; relocated data is kept
    Uninstall(Uninstall),
    /// Check launchers and data links
    Health(Health),
    /// Recreate launchers and data links without downloading
    Repair(Repair),
    /// Download an archive and show its layout and likely binaries
    Inspect(Inspect),
    /// Create a desktop entry with a custom icon
    Entry(Entry),
    /// Find and remove caches and build leftovers in the home directory
    Clean(Clean),
}

impl Command {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        match self {
            Self::Init(command) => command.run(config),
            Self::List(command) => command.run(config, catalog),
            Self::Install(command) => command.run(config, catalog),
            Self::InstallAll(command) => command.run(config, catalog),
            Self::Uninstall(command) => command.run(config, catalog),
            Self::Health(command) => command.run(config, catalog),
            Self::Repair(command) => command.run(config, catalog),
            Self::Inspect(command) => command.run(),
            Self::Entry(command) => command.run(config, catalog),
            Self::Clean(command) => command.run(config),
        }
    }
}

pub(crate) fn parse_archive_kind(s: &str) -> std::result::Result<ArchiveKind, String> {
    s.parse::<ArchiveKind>().map_err(|e| match e {
        VoidError::ValidationError(msg) => msg,
        other => other.to_string(),
    })
}

/// Prints collected per-app failures and turns them into a single error.
pub(crate) fn finish_batch(action: &str, errors: Vec<(String, VoidError)>) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    eprintln!("\n{}:", format!("Finished {action} with errors").yellow());
    for (app, error) in &errors {
        eprintln!("App '{}':", app.cyan());
        eprintln!("- {}", error.to_string().red());
    }
    Err(VoidError::Generic(format!(
        "{} failed for {} app(s).",
        capitalize(action),
        errors.len()
    )))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn install_accepts_type_override() {
        let args = CliArgs::try_parse_from([
            "void", "-vv", "install", "jq", "k9s", "--type", "raw-binary", "--no-desktop",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Install(install) => {
                assert_eq!(install.apps, vec!["jq", "k9s"]);
                assert_eq!(install.kind, Some(ArchiveKind::RawBinary));
                assert!(install.no_desktop);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = CliArgs::try_parse_from(["void", "inspect", "https://x/y", "--type", "rar"])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown archive type"));
    }

    #[test]
    fn repair_without_apps_means_all() {
        let args = CliArgs::try_parse_from(["void", "repair"]).unwrap();
        assert!(matches!(args.command, Command::Repair(ref r) if r.apps.is_empty()));
    }

    #[test]
    fn batch_errors_become_one_failure() {
        assert!(finish_batch("installing", Vec::new()).is_ok());
        let err = finish_batch(
            "installing",
            vec![("zed".to_string(), VoidError::NotFound("zed".to_string()))],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Generic Error: Installing failed for 1 app(s).");
    }
}
