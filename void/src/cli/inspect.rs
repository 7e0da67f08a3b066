use clap::Args;
use colored::Colorize;
use void_common::error::Result;
use void_common::model::ArchiveKind;
use void_core::inspect::{inspect_archive, InspectionReport};
use void_net::{validate_url, HttpDownloader};

use crate::cli::parse_archive_kind;

#[derive(Args, Debug)]
pub struct Inspect {
    /// Archive URL to download and inspect
    pub url: String,

    /// Archive type, overriding URL detection
    #[arg(long = "type", value_name = "KIND", value_parser = parse_archive_kind)]
    pub kind: Option<ArchiveKind>,
}

impl Inspect {
    pub fn run(&self) -> Result<()> {
        validate_url(&self.url)?;
        println!("Inspecting {}...", self.url.cyan());
        let downloader = HttpDownloader::new()?;
        let report = inspect_archive(&self.url, self.kind, &downloader)?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &InspectionReport) {
    println!("\n{} {}", "Archive type:".bold(), report.kind);
    match &report.root_dir {
        Some(root) => println!("{} {}/", "Root directory:".bold(), root),
        None => println!("{} (none, files at top level)", "Root directory:".bold()),
    }

    println!("\n{}", "Structure:".bold());
    for line in &report.tree {
        println!("  {line}");
    }

    println!("\n{}", "Executable candidates:".bold());
    if report.candidates.is_empty() {
        println!("  {}", "none found".yellow());
    }
    for (i, candidate) in report.candidates.iter().enumerate() {
        let line = format!(
            "  {:>2}. {} (score {})",
            i + 1,
            candidate.path.display(),
            candidate.score
        );
        if i == 0 {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }

    if let Some(bin_path) = &report.recommended_bin_path {
        println!("\n{} \"bin_path\": \"{}\"", "Suggested:".bold(), bin_path);
    }
}
