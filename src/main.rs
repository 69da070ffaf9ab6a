mod app;
mod cli;
mod core;
mod ui;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AutostartCommands, Cli, Commands, ConfigCommands};
use crate::core::autostart::Autostart;
use crate::core::metrics::build_source;
use crate::core::{ConfigStore, ReadingBoard};
use crate::utils::PanelKind;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sysboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            // No command - run the desktop overlay
            ui::run()?;
        }
        Some(Commands::Status) => {
            handle_status()?;
        }
        Some(Commands::Config { command }) => {
            handle_config(command)?;
        }
        Some(Commands::Autostart { command }) => {
            handle_autostart(command)?;
        }
    }

    Ok(())
}

/// One-shot reading of every resource, printed as a table. The risk
/// panel is sampled after the resource panels it aggregates, so it
/// sees the readings taken just before it.
fn handle_status() -> Result<()> {
    let store = Arc::new(ConfigStore::open(ConfigStore::default_path()?));
    let board = Arc::new(ReadingBoard::default());

    println!("System Resource Status\n");
    println!("{:<10} {}", "Resource", "Reading");
    println!("{}", "-".repeat(40));

    for kind in PanelKind::all() {
        let mut source = build_source(*kind, &board, &store);
        let cell = match source.fetch() {
            Ok(reading) => {
                if let Some(percent) = reading.percent {
                    board.publish(*kind, percent);
                }
                reading.text
            }
            Err(err) => format!("Error: {}", err),
        };
        let mut lines = cell.lines();
        println!("{:<10} {}", kind.label(), lines.next().unwrap_or("N/A"));
        for line in lines {
            println!("{:<10} {}", "", line);
        }
    }

    Ok(())
}

fn handle_config(command: ConfigCommands) -> Result<()> {
    let path = ConfigStore::default_path()?;
    match command {
        ConfigCommands::Show => {
            let store = ConfigStore::open(&path);
            let config = store.snapshot();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Reset => {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            let store = ConfigStore::open(&path);
            store.save()?;
            println!("Configuration reset to defaults at {}", path.display());
        }
    }
    Ok(())
}

fn handle_autostart(command: AutostartCommands) -> Result<()> {
    let autostart = Autostart::new()?;
    match command {
        AutostartCommands::Enable => {
            autostart.set_enabled(true)?;
            println!("Launch-at-login entry installed");
        }
        AutostartCommands::Disable => {
            autostart.set_enabled(false)?;
            println!("Launch-at-login entry removed");
        }
        AutostartCommands::Status => {
            if autostart.is_enabled() {
                println!("Launch-at-login entry is installed");
            } else {
                println!("Launch-at-login entry is not installed");
            }
        }
    }
    Ok(())
}
