//! Text formatting shared by the CLI table and the dashboard.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::fields::*;
use crate::task::Task;

/// Format a due date relative to today ("today 17:00", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDateTime>, today: NaiveDate) -> String {
    let Some(d) = due else {
        return "-".into();
    };
    let days = (d.date() - today).num_days();
    let day = match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n if n > 1 => format!("in {n}d"),
        n => format!("{}d late", -n),
    };
    if d.hour() == 0 && d.minute() == 0 {
        day
    } else {
        format!("{} {}", day, d.format("%H:%M"))
    }
}

/// Format a priority level for display.
pub fn format_priority(p: Option<Priority>) -> &'static str {
    match p {
        Some(Priority::Critical) => "Critical",
        Some(Priority::High) => "High",
        Some(Priority::Medium) => "Medium",
        Some(Priority::Low) => "Low",
        None => "-",
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Pending => "Pending",
        Status::InProgress => "InProgress",
        Status::Completed => "Completed",
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Render tasks as a plain-text table, one row per task.
pub fn render_table(tasks: &[&Task], today: NaiveDate) -> String {
    let mut out = format!(
        "{:<8} {:<11} {:<9} {:<14} {}\n",
        "ID", "Status", "Priority", "Due", "Title [tags]"
    );
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.iter().cloned().collect::<Vec<_>>().join(","))
        };
        out.push_str(&format!(
            "{:<8} {:<11} {:<9} {:<14} {}{}\n",
            truncate(&t.id, 8),
            format_status(t.status),
            format_priority(t.priority),
            format_due_relative(t.due_date, today),
            t.title,
            tags
        ));
    }
    out
}
