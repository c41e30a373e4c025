//! The to-do widget view: filtered, ranked and cut down to what fits on screen.

use crate::fields::DuePlacement;
use crate::rank::{filter_by_domain, normalised_domain, rank_tasks_with};
use crate::task::Task;

/// Derived, read-only view handed to a render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoView {
    /// Normalised domain the view was built for, if any.
    pub domain: Option<String>,
    /// The first `limit` ranked tasks.
    pub visible: Vec<Task>,
    /// Size of the whole domain-filtered set, not of `visible`.
    pub active_count: usize,
}

impl TodoView {
    /// Run the full pipeline: domain filter, rank, then slice to `limit`.
    pub fn build(tasks: &[Task], domain: Option<&str>, limit: usize, placement: DuePlacement) -> Self {
        let filtered = filter_by_domain(tasks, domain);
        let active_count = filtered.len();
        let mut visible = rank_tasks_with(&filtered, placement);
        visible.truncate(limit);
        tracing::debug!(
            domain = domain.unwrap_or("-"),
            active_count,
            shown = visible.len(),
            "built to-do view"
        );
        TodoView { domain: normalised_domain(domain), visible, active_count }
    }

    /// Tasks that matched but did not fit in the slice.
    pub fn hidden_count(&self) -> usize {
        self.active_count - self.visible.len()
    }

    /// Whether nothing matched the domain filter.
    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Panel title, e.g. `To-do [family] (6 of 14)`.
    pub fn title(&self) -> String {
        let scope = self.domain.as_deref().map(|d| format!(" [{d}]")).unwrap_or_default();
        format!("To-do{} ({} of {})", scope, self.visible.len(), self.active_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::parse_due_timestamp;

    fn tasks() -> Vec<Task> {
        (1..=9)
            .map(|n| {
                let t = Task::new(format!("{n}"), format!("task {n}"))
                    .with_due(parse_due_timestamp(&format!("2024-05-0{n}")).unwrap());
                let t = if n % 3 == 0 { t.with_priority(Priority::Critical) } else { t };
                if n % 2 == 0 { t.with_tag("family") } else { t.with_tag("work") }
            })
            .collect()
    }

    #[test]
    fn slice_is_limited_but_count_is_not() {
        let view = TodoView::build(&tasks(), None, 6, DuePlacement::DatedFirst);
        assert_eq!(view.visible.len(), 6);
        assert_eq!(view.active_count, 9);
        assert_eq!(view.hidden_count(), 3);
        let ids: Vec<&str> = view.visible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "6", "9", "1", "2", "4"]);
    }

    #[test]
    fn count_follows_domain_filter() {
        let view = TodoView::build(&tasks(), Some("Family"), 6, DuePlacement::DatedFirst);
        assert_eq!(view.active_count, 4);
        assert_eq!(view.visible.len(), 4);
        assert_eq!(view.domain.as_deref(), Some("family"));
        assert_eq!(view.title(), "To-do [family] (4 of 4)");
        assert_eq!(view.visible[0].id, "6");
    }

    #[test]
    fn zero_limit_keeps_count() {
        let view = TodoView::build(&tasks(), Some("work"), 0, DuePlacement::DatedFirst);
        assert!(view.visible.is_empty());
        assert_eq!(view.active_count, 5);
        assert!(!view.is_empty());
        assert_eq!(view.title(), "To-do [work] (0 of 5)");
    }

    #[test]
    fn empty_input_builds_empty_view() {
        let view = TodoView::build(&[], Some("family"), 6, DuePlacement::DatedFirst);
        assert!(view.is_empty());
        assert_eq!(view.hidden_count(), 0);
    }
}
