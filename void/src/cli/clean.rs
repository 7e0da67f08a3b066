use std::collections::BTreeMap;

use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;
use prettytable::{format, Cell, Row, Table};
use void_common::config::Config;
use void_common::error::{Result, VoidError};
use void_core::cleanup::{cleanup_items, find_cleanup_items, CleanupItem};
use void_core::fs_util::format_size;

#[derive(Args, Debug)]
pub struct Clean {
    /// Only report what would be removed
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl Clean {
    pub fn run(&self, config: &Config) -> Result<()> {
        println!("Scanning {} for removable files...", config.home_dir().display());
        let items = find_cleanup_items(config.home_dir());
        if items.is_empty() {
            println!("{}", "Nothing to clean".green());
            return Ok(());
        }
        print_items(&items);

        let total: u64 = items.iter().map(|i| i.size).sum();
        println!(
            "{}",
            format!("{} item(s), {} total", items.len(), format_size(total)).bold()
        );

        if self.dry_run {
            let (count, bytes) = cleanup_items(&items, true);
            println!("Dry run: would free {} across {} item(s)", format_size(bytes), count);
            return Ok(());
        }

        if !self.yes {
            let proceed = Confirm::new()
                .with_prompt("Delete these files?")
                .default(false)
                .interact()
                .map_err(|e| VoidError::Generic(format!("Confirmation prompt failed: {e}")))?;
            if !proceed {
                println!("Aborted, nothing removed.");
                return Ok(());
            }
        }

        let (count, bytes) = cleanup_items(&items, false);
        println!(
            "✓ Removed {} item(s), freed {}",
            count,
            format_size(bytes).green()
        );
        Ok(())
    }
}

fn print_items(items: &[CleanupItem]) {
    let mut by_category: BTreeMap<&str, Vec<&CleanupItem>> = BTreeMap::new();
    for item in items {
        by_category.entry(item.category).or_default().push(item);
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(Row::new(vec![
        Cell::new("Category").style_spec("b"),
        Cell::new("Path").style_spec("b"),
        Cell::new("Size").style_spec("b"),
    ]));
    for (category, items) in by_category {
        for item in items {
            table.add_row(Row::new(vec![
                Cell::new(category).style_spec("Fy"),
                Cell::new(&item.path.display().to_string()),
                Cell::new(&format_size(item.size)),
            ]));
        }
    }
    table.printstd();
}
