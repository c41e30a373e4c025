use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Household dashboard with a ranked family to-do list.
/// Data lives in ~/.hearth (or $HEARTH_HOME, or --root), one JSON file per household.
#[derive(Parser)]
#[command(name = "hearth", version, about = "Household dashboard and family to-do list")]
pub struct Cli {
    /// Directory holding config.toml and the household task files.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Path to the TOML config file (default: <root>/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Household context to operate on (default from config, else "family").
    #[arg(long, global = true)]
    pub context: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
