//! Dashboard configuration.
//!
//! Settings live in `<root>/config.toml`. Every key is optional; a missing
//! file means defaults. Command line flags override whatever is loaded here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::DEFAULT_CONTEXT;
use crate::error::ConfigError;
use crate::fields::DuePlacement;

/// Number of tasks the to-do widget shows.
pub const DEFAULT_TODO_LIMIT: usize = 6;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 250;
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DashboardConfig {
    pub todo_limit: usize,
    pub default_context: String,
    pub default_domain: Option<String>,
    pub due_placement: DuePlacement,
    pub search_debounce_ms: u64,
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            todo_limit: DEFAULT_TODO_LIMIT,
            default_context: DEFAULT_CONTEXT.to_string(),
            default_domain: None,
            due_placement: DuePlacement::default(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            log_level: "warn".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Resolve the hearth root: explicit flag, then `$HEARTH_HOME`, then `~/.hearth`.
pub fn resolve_root(flag: Option<&Path>) -> PathBuf {
    if let Some(p) = flag {
        return p.to_path_buf();
    }
    if let Ok(home) = std::env::var("HEARTH_HOME") {
        if !home.trim().is_empty() {
            return PathBuf::from(home);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".hearth")
}
