//! Task data structure and related functionality.
//!
//! This module defines the `Task` record shared by the task source, the
//! ranking pipeline and the render surfaces.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::*;

/// A household to-do item.
///
/// Tasks are owned by a task source. The ranking pipeline only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        rename = "dueDate",
        alias = "due_date",
        alias = "due",
        deserialize_with = "lenient_due_date"
    )]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "normalised_tags")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub created_at_utc: i64,
    #[serde(default)]
    pub updated_at_utc: i64,
}

fn default_status() -> Status {
    Status::Pending
}

impl Task {
    /// Create a pending task with no optional metadata.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            status: Status::Pending,
            priority: None,
            due_date: None,
            tags: BTreeSet::new(),
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    /// Set the task's priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the task's due date and time.
    pub fn with_due(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Add a tag, normalised the same way as tags read from disk.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(crate::store::normalise_tag(tag));
        self
    }

    /// Set the task's status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Whether the task belongs to the given (already normalised) domain.
    pub fn has_tag(&self, domain: &str) -> bool {
        self.tags.contains(domain)
    }
}

/// Parse a stored due date.
///
/// Accepts a bare `YYYY-MM-DD` (midnight) as well as date-times separated by
/// `T` or a space, with or without seconds.
pub fn parse_due_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    // RFC 3339 timestamps written by other tools keep their wall-clock value.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn lenient_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => {
            let parsed = parse_due_timestamp(&s);
            if parsed.is_none() {
                tracing::warn!(value = %s, "unparseable due date, treating as unset");
            }
            parsed
        }
        Some(other) => {
            tracing::warn!(value = %other, "non-string due date, treating as unset");
            None
        }
    })
}

/// Deserialize tags through `normalise_tag`, dropping blank entries.
fn normalised_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .map(|t| crate::store::normalise_tag(t))
        .filter(|t| !t.is_empty())
        .collect())
}
