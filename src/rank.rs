//! Domain filtering and priority/due-date ranking for the to-do widget.
//!
//! Everything here is a pure transformation over an already loaded task
//! list: inputs are never mutated and every function returns a fresh view.

use std::cmp::Ordering;

use crate::fields::{DuePlacement, Priority};
use crate::store::normalise_tag;
use crate::task::Task;

/// Rank assigned to tasks without a recognised priority.
pub const UNRANKED: u8 = 4;

/// Fixed priority rank: critical 0, high 1, medium 2, low 3, anything else last.
pub fn priority_rank(p: Option<Priority>) -> u8 {
    match p {
        Some(Priority::Critical) => 0,
        Some(Priority::High) => 1,
        Some(Priority::Medium) => 2,
        Some(Priority::Low) => 3,
        None => UNRANKED,
    }
}

/// Keep only tasks tagged with `domain`, or everything when no domain is given.
///
/// The domain goes through the same normalisation as stored tags, so
/// `"Family "` matches a task tagged `family`. A blank domain means no filter.
pub fn filter_by_domain(tasks: &[Task], domain: Option<&str>) -> Vec<Task> {
    match normalised_domain(domain) {
        Some(d) => tasks.iter().filter(|t| t.has_tag(&d)).cloned().collect(),
        None => tasks.to_vec(),
    }
}

/// Normalise a requested domain; blank means no filter.
pub(crate) fn normalised_domain(domain: Option<&str>) -> Option<String> {
    domain.map(normalise_tag).filter(|d| !d.is_empty())
}

/// Compare two tasks by priority rank, then due date.
///
/// When only one side has a due date, `placement` decides which comes first,
/// which keeps the order total.
pub fn compare_tasks(a: &Task, b: &Task, placement: DuePlacement) -> Ordering {
    priority_rank(a.priority)
        .cmp(&priority_rank(b.priority))
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => match placement {
                DuePlacement::DatedFirst => Ordering::Less,
                DuePlacement::UndatedFirst => Ordering::Greater,
            },
            (None, Some(_)) => match placement {
                DuePlacement::DatedFirst => Ordering::Greater,
                DuePlacement::UndatedFirst => Ordering::Less,
            },
            (None, None) => Ordering::Equal,
        })
}

/// Rank tasks with the default dated-first tie-break.
pub fn rank_tasks(tasks: &[Task]) -> Vec<Task> {
    rank_tasks_with(tasks, DuePlacement::default())
}

/// Rank tasks into a new vector. Equal tasks keep their input order.
pub fn rank_tasks_with(tasks: &[Task], placement: DuePlacement) -> Vec<Task> {
    let mut ranked = tasks.to_vec();
    // `sort_by` is stable; the input position is the final tie-break.
    ranked.sort_by(|a, b| compare_tasks(a, b, placement));
    tracing::debug!(count = ranked.len(), ?placement, "ranked tasks");
    ranked
}

/// Borrowing variant of [`rank_tasks_with`] for callers that only print.
pub fn rank_refs(tasks: &mut [&Task], placement: DuePlacement) {
    tasks.sort_by(|a, b| compare_tasks(a, b, placement));
}
