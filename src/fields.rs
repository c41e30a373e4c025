//! Enumerations and field types for household tasks.
//!
//! This module defines the structured values used to categorise to-do items:
//! priority levels, completion status and the due-date tie-break policy used
//! when ranking.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[serde(alias = "Critical")]
    Critical,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Low")]
    Low,
}

impl Priority {
    /// Parse a priority label, ignoring case and surrounding whitespace.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// Task completion status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "Pending", alias = "open")]
    Pending,
    #[serde(alias = "InProgress", alias = "in_progress")]
    InProgress,
    #[serde(alias = "Completed", alias = "done")]
    Completed,
}

impl Status {
    /// Pending and in-progress tasks count towards the active to-do list.
    pub fn is_active(self) -> bool {
        !matches!(self, Status::Completed)
    }
}

/// Which task wins a tie when only one of two equally prioritised tasks has a due date.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DuePlacement {
    #[default]
    DatedFirst,
    UndatedFirst,
}

/// Which statuses a task source should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusScope {
    #[default]
    Active,
    All,
}

impl StatusScope {
    /// Whether a task with `status` belongs in this scope.
    pub fn includes(self, status: Status) -> bool {
        match self {
            StatusScope::Active => status.is_active(),
            StatusScope::All => true,
        }
    }
}

/// Deserialize an optional priority, mapping unknown labels to `None`.
///
/// Household files are hand-edited and shared between tools, so an
/// unrecognised value must not make the whole file unreadable.
pub fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => {
            let parsed = Priority::from_label(&s);
            if parsed.is_none() && !s.trim().is_empty() {
                tracing::warn!(value = %s, "unknown priority, treating as unset");
            }
            parsed
        }
        Some(other) => {
            tracing::warn!(value = %other, "non-string priority, treating as unset");
            None
        }
    })
}
