/// CLI argument parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sysboard")]
#[command(author, version, about = "Floating desktop panels for system resource monitoring", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a one-shot reading for every resource
    Status,

    /// Inspect or reset the persisted panel layout
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the launch-at-login entry
    Autostart {
        #[command(subcommand)]
        command: AutostartCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the persisted configuration
    Show,
    /// Reset positions, enabled flags and refresh rate to defaults
    Reset,
}

#[derive(Subcommand)]
pub enum AutostartCommands {
    /// Install the launch-at-login entry
    Enable,
    /// Remove the launch-at-login entry
    Disable,
    /// Show whether the entry is installed
    Status,
}
