use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use void_common::config::{Config, Profile};
use void_common::error::Result;
use void_common::{Catalog, Offline};
use void_core::{InstallState, Installer, LinkManager};

#[derive(Args, Debug)]
pub struct List {
    /// Only show installed (or incomplete) apps
    #[arg(long)]
    pub installed: bool,
}

impl List {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        if catalog.is_empty() {
            println!("{}", "The app catalog is empty".yellow());
            return Ok(());
        }
        let installer = Installer::new(config, Offline);
        let links = LinkManager::new(config);
        let profile = Profile::load(config).unwrap_or_default();

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("App").style_spec("b"),
            Cell::new("Type").style_spec("b"),
            Cell::new("Command").style_spec("b"),
            Cell::new("State").style_spec("b"),
            Cell::new("Profile").style_spec("b"),
        ]));

        let mut installed_count = 0;
        let mut shown = 0;
        for app in catalog.iter() {
            let state = installer.state(app, None);
            if self.installed && state == InstallState::NotInstalled {
                continue;
            }
            let state_style = match state {
                InstallState::Installed => {
                    installed_count += 1;
                    "Fg"
                }
                InstallState::InstalledIncomplete => "Fy",
                InstallState::NotInstalled => "",
            };
            let in_profile = profile.apps.iter().any(|k| *k == app.key);
            table.add_row(Row::new(vec![
                Cell::new(&app.key).style_spec("Fb"),
                Cell::new(links.installed_kind(app).as_str()),
                Cell::new(&app.link_name),
                Cell::new(&state.to_string()).style_spec(state_style),
                Cell::new(if in_profile { "✔" } else { "" }),
            ]));
            shown += 1;
        }

        if shown == 0 {
            println!("{}", "0 apps installed".yellow());
            return Ok(());
        }
        table.printstd();
        println!(
            "{}",
            format!("{installed_count} of {} apps installed", catalog.len()).bold()
        );
        Ok(())
    }
}
