//! Household contexts.
//!
//! A context scopes which tasks belong together (one household, one shared
//! workspace). Each context is stored as its own JSON file named
//! `<context>_tasks.json` under the hearth root directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Context used when neither the CLI nor the config names one.
pub const DEFAULT_CONTEXT: &str = "family";

const FILE_SUFFIX: &str = "_tasks";

/// A validated, file-name safe context identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(String);

impl ContextId {
    /// Sanitise a display name into a context id. Blank names are rejected.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let name = sanitize_context_name(raw);
        if name.is_empty() {
            return Err(StoreError::InvalidContext(raw.to_string()));
        }
        Ok(ContextId(name))
    }

    /// Path of this context's task file under `root`.
    pub fn file_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}{}.json", self.0, FILE_SUFFIX))
    }

    /// Recover a context id from a task file path.
    pub fn from_file(path: &Path) -> Option<Self> {
        if path.extension()?.to_str()? != "json" {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let name = stem.strip_suffix(FILE_SUFFIX)?;
        ContextId::parse(name).ok()
    }

    /// Human readable form, underscores shown as spaces.
    pub fn display_name(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a display name to a safe context name for file naming.
/// Lowercases and collapses every run of non-alphanumerics into one underscore.
pub fn sanitize_context_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all contexts that have a task file in `root`, sorted by name.
pub fn discover_contexts(root: &Path) -> Result<Vec<ContextId>, StoreError> {
    let mut contexts = Vec::new();

    if !root.exists() {
        return Ok(contexts);
    }

    let entries = fs::read_dir(root).map_err(|source| StoreError::Io { path: root.to_path_buf(), source })?;
    for entry in entries {
        let path = entry
            .map_err(|source| StoreError::Io { path: root.to_path_buf(), source })?
            .path();
        if path.is_file() {
            if let Some(ctx) = ContextId::from_file(&path) {
                contexts.push(ctx);
            }
        }
    }

    contexts.sort();
    Ok(contexts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_context_name() {
        assert_eq!(sanitize_context_name("The Smiths"), "the_smiths");
        assert_eq!(sanitize_context_name("Grandma-House_2"), "grandma_house_2");
        assert_eq!(sanitize_context_name("Special!@#$%Characters"), "special_characters");
        assert_eq!(sanitize_context_name("  Multiple   Spaces  "), "multiple_spaces");
        assert_eq!(sanitize_context_name(""), "");
    }

    #[test]
    fn blank_context_is_rejected() {
        assert!(matches!(ContextId::parse("  !! "), Err(StoreError::InvalidContext(_))));
    }

    #[test]
    fn file_path_round_trips() {
        let ctx = ContextId::parse("Holiday Cottage").unwrap();
        let path = ctx.file_path(Path::new("/tmp/hearth"));
        assert_eq!(path, PathBuf::from("/tmp/hearth/holiday_cottage_tasks.json"));
        assert_eq!(ContextId::from_file(&path), Some(ctx));
        assert_eq!(ContextId::from_file(Path::new("/tmp/hearth/config.toml")), None);
        assert_eq!(ContextId::from_file(Path::new("/tmp/hearth/notes.json")), None);
    }

    #[test]
    fn discovers_contexts_from_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("work_tasks.json"), "{}").unwrap();
        fs::write(dir.path().join("family_tasks.json"), "{}").unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        let found: Vec<String> = discover_contexts(dir.path())
            .unwrap()
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(found, vec!["family", "work"]);
    }

    #[test]
    fn missing_root_has_no_contexts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_contexts(&dir.path().join("absent")).unwrap().is_empty());
    }
}
