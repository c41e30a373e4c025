//! Task sources and input helpers.
//!
//! `TaskSource` is the seam between the ranking pipeline and wherever tasks
//! actually live. `FileStore` keeps one JSON `Database` per household
//! context.

#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::context::ContextId;
use crate::error::StoreError;
use crate::fields::StatusScope;
use crate::task::Task;

/// Something that can hand out the tasks of a context.
pub trait TaskSource {
    fn tasks(&self, context: &ContextId, scope: StatusScope) -> Result<Vec<Task>, StoreError>;
}

/// In-memory database for one context's tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
}

impl Database {
    /// Load database from a JSON file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no task file yet, starting empty");
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        let db: Database = serde_json::from_str(&buf).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "task file is corrupt");
            StoreError::Parse { path: path.to_path_buf(), source }
        })?;
        tracing::debug!(path = %path.display(), count = db.tasks.len(), "loaded tasks");
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)
            .map_err(|source| StoreError::Parse { path: path.to_path_buf(), source })?;
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        tracing::debug!(path = %path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    /// Generate the next available task ID (`t-<n>`).
    pub fn next_id(&self) -> String {
        let max = self
            .tasks
            .iter()
            .filter_map(|t| t.id.strip_prefix("t-").and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);
        format!("t-{}", max + 1)
    }

    /// Look up a task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a task by id for in-place edits.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Remove a task, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Task, StoreError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    /// Tasks within `scope`, in storage order.
    pub fn scoped(&self, scope: StatusScope) -> Vec<Task> {
        self.tasks.iter().filter(|t| scope.includes(t.status)).cloned().collect()
    }
}

/// File-backed task source: one `<context>_tasks.json` per context under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. Nothing is touched on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// Directory holding the context files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Task file for `context`.
    pub fn path_for(&self, context: &ContextId) -> PathBuf {
        context.file_path(&self.root)
    }

    /// Load a context's database, empty if it has no file yet.
    pub fn load(&self, context: &ContextId) -> Result<Database, StoreError> {
        Database::load(&self.path_for(context))
    }

    /// Persist a context's database atomically.
    pub fn save(&self, context: &ContextId, db: &Database) -> Result<(), StoreError> {
        db.save(&self.path_for(context))
    }
}

impl TaskSource for FileStore {
    fn tasks(&self, context: &ContextId, scope: StatusScope) -> Result<Vec<Task>, StoreError> {
        Ok(self.load(context)?.scoped(scope))
    }
}

/// Task source over tasks already held in memory, keyed by context.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    contexts: HashMap<ContextId, Vec<Task>>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tasks held for `context`.
    pub fn insert(&mut self, context: ContextId, tasks: Vec<Task>) {
        self.contexts.insert(context, tasks);
    }
}

#[cfg(test)]
impl TaskSource for MemorySource {
    fn tasks(&self, context: &ContextId, scope: StatusScope) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .contexts
            .get(context)
            .map(|tasks| tasks.iter().filter(|t| scope.includes(t.status)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Normalise a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalise each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Parse human-readable due input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "end of week", "end of month", "weekend"
/// - "in 3d", "in 2w"
/// - weekday names, optionally prefixed with "next" or "this"
/// - "YYYY-MM-DD" and full timestamps
///
/// Any of the relative forms may be followed by a `HH:MM` time ("tomorrow 17:30").
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    if let Some(dt) = crate::task::parse_due_timestamp(s) {
        return Some(dt);
    }
    let s = s.trim().to_lowercase();

    let (date_part, time) = match s.rsplit_once(' ') {
        Some((head, tail)) => match NaiveTime::parse_from_str(tail, "%H:%M") {
            Ok(t) => (head.to_string(), t),
            Err(_) => (s.clone(), NaiveTime::MIN),
        },
        None => (s.clone(), NaiveTime::MIN),
    };

    parse_due_date(&date_part, today).map(|d| d.and_time(time))
}

fn parse_due_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => return Some(start_end_of_this_week(today).1),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(i64::from(days_until_saturday)));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Duration::try_days(n).and_then(|d| today.checked_add_signed(d));
        }
        if let Some(n) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Duration::try_weeks(n).and_then(|d| today.checked_add_signed(d));
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let (next_week, name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(s)),
    };
    let target = weekdays.iter().find(|(day, _)| *day == name).map(|(_, n)| *n)?;
    let current = today.weekday().num_days_from_monday() as i64;
    let days_ahead = (target - current).rem_euclid(7);
    let days = if next_week { days_ahead + 7 } else { days_ahead };
    Some(today + Duration::days(days))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Today's date in local time, used as the anchor for relative input.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{DuePlacement, Priority, Status};
    use crate::rank::filter_by_domain;
    use crate::view::TodoView;
    use rstest::rstest;

    fn ctx(name: &str) -> ContextId {
        ContextId::parse(name).unwrap()
    }

    // 2024-03-06 is a Wednesday.
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
    }

    #[rstest]
    #[case("today", "2024-03-06 00:00:00")]
    #[case("tomorrow", "2024-03-07 00:00:00")]
    #[case("tomorrow 17:30", "2024-03-07 17:30:00")]
    #[case("in 3d", "2024-03-09 00:00:00")]
    #[case("in 2w", "2024-03-20 00:00:00")]
    #[case("eow", "2024-03-10 00:00:00")]
    #[case("eom", "2024-03-31 00:00:00")]
    #[case("weekend", "2024-03-09 00:00:00")]
    #[case("friday", "2024-03-08 00:00:00")]
    #[case("wed", "2024-03-06 00:00:00")]
    #[case("next monday", "2024-03-18 00:00:00")]
    #[case("this fri 08:00", "2024-03-08 08:00:00")]
    #[case("2024-12-25", "2024-12-25 00:00:00")]
    #[case("2024-12-25 07:15", "2024-12-25 07:15:00")]
    #[case("2024-12-25T07:15", "2024-12-25 07:15:00")]
    #[case("Tomorrow", "2024-03-07 00:00:00")]
    fn parses_due_input(#[case] input: &str, #[case] expected: &str) {
        let got = parse_due_input(input, wednesday()).unwrap();
        assert_eq!(got.to_string(), expected);
    }

    #[rstest]
    #[case("someday")]
    #[case("in xd")]
    #[case("in 100000000d")]
    #[case("in 9223372036854775807w")]
    #[case("in -100000000d")]
    fn rejects_nonsense_due_input(#[case] input: &str) {
        assert_eq!(parse_due_input(input, wednesday()), None);
    }

    #[test]
    fn splits_and_normalises_tags() {
        let tags = split_and_normalise_tags(&["Family, School Run".into(), "family".into(), " ,".into()]);
        assert_eq!(tags, vec!["family", "school-run"]);
    }

    #[test]
    fn next_id_follows_highest_numeric_id() {
        let mut db = Database::default();
        assert_eq!(db.next_id(), "t-1");
        db.tasks.push(Task::new("t-7", "a"));
        db.tasks.push(Task::new("imported", "b"));
        db.tasks.push(Task::new("t-3", "c"));
        assert_eq!(db.next_id(), "t-8");
        assert_eq!(db.get("t-3").unwrap().title, "c");
    }

    #[test]
    fn remove_reports_missing_task() {
        let mut db = Database { tasks: vec![Task::new("t-1", "a")] };
        assert!(matches!(db.remove("t-9"), Err(StoreError::TaskNotFound(id)) if id == "t-9"));
        assert_eq!(db.remove("t-1").unwrap().title, "a");
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn file_store_round_trips_a_context() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let family = ctx("family");

        let db = Database {
            tasks: vec![
                Task::new("t-1", "Dentist").with_priority(Priority::High).with_tag("family"),
                Task::new("t-2", "Old chore").with_status(Status::Completed),
            ],
        };
        store.save(&family, &db).unwrap();
        assert!(dir.path().join("family_tasks.json").exists());

        let active = store.tasks(&family, StatusScope::Active).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Dentist");
        assert_eq!(store.tasks(&family, StatusScope::All).unwrap().len(), 2);
        assert!(store.tasks(&ctx("work"), StatusScope::All).unwrap().is_empty());
    }

    #[test]
    fn hand_edited_tags_match_domain_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let json = r#"{"tasks": [
            {"id": "1", "title": "Vet", "priority": "high", "tags": ["Family"]},
            {"id": "2", "title": "Pack lunches", "priority": "critical", "tags": [" School Run ", "FAMILY"]},
            {"id": "3", "title": "Taxes", "tags": ["Work"]},
            {"id": "4", "title": "Old chore", "status": "completed", "tags": ["Family"]}
        ]}"#;
        fs::write(dir.path().join("family_tasks.json"), json).unwrap();

        let active = store.tasks(&ctx("family"), StatusScope::Active).unwrap();
        let view = TodoView::build(&active, Some("Family"), 6, DuePlacement::DatedFirst);
        assert_eq!(view.active_count, 2);
        let ids: Vec<&str> = view.visible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let view = TodoView::build(&active, Some("school run"), 6, DuePlacement::DatedFirst);
        assert_eq!(view.active_count, 1);
        assert_eq!(view.visible[0].title, "Pack lunches");
        assert_eq!(filter_by_domain(&active, Some("work")).len(), 1);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(dir.path().join("family_tasks.json"), "{ not json").unwrap();
        assert!(matches!(store.tasks(&ctx("family"), StatusScope::All), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn memory_source_scopes_by_context_and_status() {
        let mut source = MemorySource::new();
        source.insert(
            ctx("family"),
            vec![Task::new("1", "a"), Task::new("2", "b").with_status(Status::Completed)],
        );
        assert_eq!(source.tasks(&ctx("family"), StatusScope::Active).unwrap().len(), 1);
        assert_eq!(source.tasks(&ctx("family"), StatusScope::All).unwrap().len(), 2);
        assert!(source.tasks(&ctx("other"), StatusScope::All).unwrap().is_empty());
    }
}
