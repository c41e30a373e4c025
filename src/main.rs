//! # hearth - household dashboard CLI
//!
//! A terminal dashboard for running a home: the family to-do list ranked by
//! priority and due date, filterable by domain tags such as `family`, `dog`
//! or `meals`.
//!
//! ## Key Features
//!
//! - **Ranked to-do widget**: critical before high before medium before low,
//!   earliest due date first within a priority, unprioritised tasks last.
//! - **Domains**: tags double as widget filters (`hearth todo --domain family`).
//! - **Households**: each context is its own JSON file under `~/.hearth/`.
//! - **Dashboard**: `hearth ui` opens a ratatui dashboard with debounced search.
//!
//! ## Quick Start
//!
//! ```bash
//! hearth add "Book vet" --priority critical --due "friday 09:00" --tag family,dog
//! hearth todo --domain family
//! hearth ui
//! ```
//!
//! Settings such as the number of tasks shown live in `~/.hearth/config.toml`.
//! Set `HEARTH_LOG=debug` to see what the dashboard is doing.

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod fields;
pub mod logging;
pub mod rank;
pub mod store;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod debounce;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::{run_command, Session};
use config::{resolve_root, DashboardConfig, CONFIG_FILE};
use context::ContextId;
use error::HearthError;
use store::FileStore;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), HearthError> {
    let root = resolve_root(cli.root.as_deref());
    let config_path = cli.config.clone().unwrap_or_else(|| root.join(CONFIG_FILE));
    let config = DashboardConfig::load(&config_path)?;

    logging::init(&config.log_level);
    tracing::debug!(root = %root.display(), config = %config_path.display(), "starting hearth");

    let context_name = cli.context.as_deref().unwrap_or(&config.default_context);
    let context = ContextId::parse(context_name)?;

    let session = Session { store: FileStore::new(root), context, config };
    run_command(&session, cli.command)
}
