//! Main application logic for the household dashboard.
//!
//! `App` owns all dashboard state: the loaded context, the active domain,
//! the derived to-do view and the search box. Input handling mutates that
//! state; rendering only reads it.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::config::DashboardConfig;
use crate::context::ContextId;
use crate::display::{format_due_relative, format_priority, format_status};
use crate::error::{HearthError, StoreError};
use crate::fields::{Status, StatusScope};
use crate::store::{local_today, normalise_tag, Database, FileStore};
use crate::task::Task;
use crate::tui::{
    colors::{priority_color, HEARTH_ORANGE},
    debounce::Debouncer,
    enums::AppState,
    input::InputField,
    utils::centered_rect,
};
use crate::view::TodoView;

pub struct App {
    state: AppState,
    store: FileStore,
    context: ContextId,
    config: DashboardConfig,
    db: Database,
    domain: Option<String>,
    view: TodoView,
    table_state: TableState,
    search: InputField,
    query: String,
    debouncer: Debouncer<String>,
    quick_add: InputField,
    status_message: String,
}

impl App {
    /// Load `context` from `store` and build the initial view.
    pub fn new(
        store: FileStore,
        context: ContextId,
        config: DashboardConfig,
        domain: Option<String>,
    ) -> Result<Self, StoreError> {
        let db = store.load(&context)?;
        let debouncer = Debouncer::new(Duration::from_millis(config.search_debounce_ms));
        let mut app = App {
            state: AppState::Todo,
            store,
            context,
            config,
            db,
            domain: domain.map(|d| normalise_tag(&d)).filter(|d| !d.is_empty()),
            view: TodoView::build(&[], None, 0, Default::default()),
            table_state: TableState::default(),
            search: InputField::new(),
            query: String::new(),
            debouncer,
            quick_add: InputField::new(),
            status_message: String::new(),
        };
        app.rebuild_view();
        Ok(app)
    }

    /// The currently displayed to-do view.
    pub fn view(&self) -> &TodoView {
        &self.view
    }

    /// Current interaction state.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Active domain filter, if any.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Query currently applied to the to-do list (not the one being typed).
    pub fn applied_query(&self) -> &str {
        &self.query
    }

    /// Distinct tags across active tasks; the domains `d` cycles through.
    pub fn known_domains(&self) -> Vec<String> {
        let tags: BTreeSet<&String> = self
            .db
            .tasks
            .iter()
            .filter(|t| t.status.is_active())
            .flat_map(|t| t.tags.iter())
            .collect();
        tags.into_iter().cloned().collect()
    }

    /// Move to the next domain: none, then each known tag in order, then none again.
    pub fn cycle_domain(&mut self) {
        let domains = self.known_domains();
        self.domain = match &self.domain {
            None => domains.first().cloned(),
            Some(current) => {
                let pos = domains.iter().position(|d| d == current);
                pos.and_then(|i| domains.get(i + 1)).cloned()
            }
        };
        self.rebuild_view();
        self.status_message = match &self.domain {
            Some(d) => format!("Domain: {d}"),
            None => "Domain: all".to_string(),
        };
    }

    /// Recompute the view from the loaded database, keeping the selection if possible.
    fn rebuild_view(&mut self) {
        let old_selected = self.selected_task().map(|t| t.id.clone());

        let needle = self.query.to_lowercase();
        let active: Vec<Task> = self
            .db
            .scoped(StatusScope::Active)
            .into_iter()
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .collect();
        self.view = TodoView::build(
            &active,
            self.domain.as_deref(),
            self.config.todo_limit,
            self.config.due_placement,
        );

        let restored = old_selected.and_then(|id| self.view.visible.iter().position(|t| t.id == id));
        self.table_state.select(match restored {
            Some(i) => Some(i),
            None if self.view.visible.is_empty() => None,
            None => Some(0),
        });
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        self.db = self.store.load(&self.context)?;
        self.rebuild_view();
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.store.save(&self.context, &self.db)?;
        self.rebuild_view();
        Ok(())
    }

    /// Task under the table cursor.
    pub fn selected_task(&self) -> Option<&Task> {
        self.table_state.selected().and_then(|i| self.view.visible.get(i))
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.view.visible.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down { (current + 1) % len } else { (current + len - 1) % len };
        self.table_state.select(Some(next));
    }

    /// Set the selected task's status and persist.
    fn set_selected_status(&mut self, status: Status) -> Result<(), StoreError> {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return Ok(());
        };
        let task = self.db.get_mut(&id).ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        task.status = status;
        task.updated_at_utc = Utc::now().timestamp();
        let title = task.title.clone();
        self.save()?;
        tracing::info!(task = %id, ?status, "updated task status");
        self.status_message = format!("{}: {}", format_status(status), title);
        Ok(())
    }

    /// Add a pending task, tagged with the current domain if one is selected.
    fn add_task(&mut self, title: String) -> Result<(), StoreError> {
        if title.is_empty() {
            self.status_message = "Title cannot be empty".to_string();
            return Ok(());
        }
        let now = Utc::now().timestamp();
        let mut task = Task::new(self.db.next_id(), title);
        if let Some(d) = &self.domain {
            task.tags.insert(d.clone());
        }
        task.created_at_utc = now;
        task.updated_at_utc = now;
        let id = task.id.clone();
        self.db.tasks.push(task);
        self.save()?;
        tracing::info!(task = %id, "added task from dashboard");
        self.status_message = format!("Added task {id}");
        Ok(())
    }

    /// Apply a debounced search query once its quiet period has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some((generation, query)) = self.debouncer.poll(now) {
            self.apply_query(generation, query);
        }
    }

    fn apply_query(&mut self, generation: u64, query: String) {
        tracing::debug!(generation, query = %query, "applying search");
        self.query = query;
        self.rebuild_view();
    }

    /// Handle a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyCode, now: Instant) -> Result<bool, StoreError> {
        match self.state {
            AppState::Todo => return self.handle_todo_key(key),
            AppState::Search => self.handle_search_key(key, now),
            AppState::QuickAdd => self.handle_quick_add_key(key)?,
            AppState::Help => {
                if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
                    self.state = AppState::Todo;
                }
            }
        }
        Ok(false)
    }

    fn handle_todo_key(&mut self, key: KeyCode) -> Result<bool, StoreError> {
        match key {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Char(' ') | KeyCode::Char('c') => self.set_selected_status(Status::Completed)?,
            KeyCode::Char('s') => {
                let next = match self.selected_task().map(|t| t.status) {
                    Some(Status::InProgress) => Status::Pending,
                    _ => Status::InProgress,
                };
                self.set_selected_status(next)?;
            }
            KeyCode::Char('d') => self.cycle_domain(),
            KeyCode::Char('/') => {
                self.search.value = self.query.clone();
                self.search.cursor = self.query.chars().count();
                self.state = AppState::Search;
            }
            KeyCode::Char('a') => {
                self.quick_add.clear();
                self.state = AppState::QuickAdd;
            }
            KeyCode::Char('r') => {
                self.reload()?;
                self.status_message = "Reloaded".to_string();
            }
            KeyCode::Char('h') => self.state = AppState::Help,
            _ => {}
        }
        Ok(false)
    }

    fn handle_search_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            KeyCode::Esc => {
                self.debouncer.cancel();
                self.search.clear();
                let generation = self.debouncer.generation();
                self.apply_query(generation, String::new());
                self.state = AppState::Todo;
                return;
            }
            KeyCode::Enter => {
                // Apply whatever was typed last without waiting for the quiet period.
                if let Some((generation, query)) = self.debouncer.flush() {
                    self.apply_query(generation, query);
                }
                self.state = AppState::Todo;
                return;
            }
            KeyCode::Char(c) => self.search.handle_char(c),
            KeyCode::Backspace => self.search.handle_backspace(),
            KeyCode::Left => self.search.move_cursor_left(),
            KeyCode::Right => self.search.move_cursor_right(),
            _ => return,
        }
        self.debouncer.submit(self.search.value.clone(), now);
    }

    fn handle_quick_add_key(&mut self, key: KeyCode) -> Result<(), StoreError> {
        match key {
            KeyCode::Esc => self.state = AppState::Todo,
            KeyCode::Enter => {
                let title = self.quick_add.take();
                self.state = AppState::Todo;
                self.add_task(title)?;
            }
            KeyCode::Char(c) => self.quick_add.handle_char(c),
            KeyCode::Backspace => self.quick_add.handle_backspace(),
            KeyCode::Left => self.quick_add.move_cursor_left(),
            KeyCode::Right => self.quick_add.move_cursor_right(),
            _ => {}
        }
        Ok(())
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let domain = self.domain.as_deref().unwrap_or("all");
        let header_text = vec![Line::from(vec![
            Span::styled("HEARTH", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Household: {}  Domain: {}", self.context.display_name(), domain),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_todo(&mut self, f: &mut Frame, area: Rect) {
        let today = local_today();

        let header = Row::new(["Priority", "Due", "Status", "Title"].iter().map(|h| {
            Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(HEARTH_ORANGE).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .view
            .visible
            .iter()
            .map(|task| {
                let tags = if task.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", task.tags.iter().cloned().collect::<Vec<_>>().join(","))
                };
                let style = match task.status {
                    Status::InProgress => Style::default()
                        .fg(priority_color(task.priority))
                        .add_modifier(Modifier::BOLD),
                    _ => Style::default().fg(priority_color(task.priority)),
                };
                Row::new(vec![
                    Cell::from(format_priority(task.priority)),
                    Cell::from(format_due_relative(task.due_date, today)),
                    Cell::from(format_status(task.status)),
                    Cell::from(format!("{}{}", task.title, tags)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(20),
        ];

        let mut title = self.view.title();
        if !self.query.is_empty() {
            title.push_str(&format!(" matching '{}'", self.query));
        }

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_detail(&self, f: &mut Frame, area: Rect) {
        let lines = match self.selected_task() {
            Some(task) => {
                let due = task
                    .due_date
                    .map(|d| d.format("%a %d %b %Y %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let tags = task.tags.iter().cloned().collect::<Vec<_>>().join(", ");
                vec![
                    Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
                    Line::from(format!("ID: {}", task.id)),
                    Line::from(format!("Priority: {}", format_priority(task.priority))),
                    Line::from(format!("Due: {due}")),
                    Line::from(format!("Tags: {}", if tags.is_empty() { "-" } else { tags.as_str() })),
                    Line::from(""),
                    Line::from(task.description.clone().unwrap_or_default()),
                ]
            }
            None => vec![Line::from("Nothing to do.")],
        };
        let detail = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true });
        f.render_widget(detail, area);
    }

    fn render_input_popup(f: &mut Frame, title: &str, field: &InputField) {
        let area = centered_rect(60, 20, f.area());
        f.render_widget(Clear, area);
        let popup = Paragraph::new(field.value.as_str())
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(popup, area);
        f.set_cursor_position((popup_cursor_x(area, field.cursor), area.y + 1));
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(50, 60, f.area());
        f.render_widget(Clear, area);
        let help = vec![
            Line::from("j/k or arrows  move"),
            Line::from("space or c     mark completed"),
            Line::from("s              toggle in progress"),
            Line::from("d              cycle domain"),
            Line::from("/              search titles"),
            Line::from("a              quick add"),
            Line::from("r              reload from disk"),
            Line::from("q              quit"),
        ];
        let popup = Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("Help"));
        f.render_widget(popup, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Search => format!("Search: {} (Enter to apply, Esc to clear)", self.search.value),
                AppState::QuickAdd => "Quick add (Enter to save, Esc to cancel)".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Todo => format!(
                    "{} active, {} hidden | Press 'h' for help",
                    self.view.active_count,
                    self.view.hidden_count()
                ),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(HEARTH_ORANGE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        self.render_header(f, chunks[0]);
        self.render_todo(f, body[0]);
        self.render_detail(f, body[1]);
        self.render_status_bar(f, chunks[2]);

        match self.state {
            AppState::Search => Self::render_input_popup(f, "Search", &self.search),
            AppState::QuickAdd => Self::render_input_popup(f, "New task", &self.quick_add),
            AppState::Help => self.render_help(f),
            AppState::Todo => {}
        }
    }

    /// Main event loop: draw, wait briefly for input, apply due searches.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), HearthError> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.status_message.clear();
                    if self.handle_key(key.code, Instant::now())? {
                        return Ok(());
                    }
                }
            }
            self.tick(Instant::now());
        }
    }
}

/// Column of the text cursor inside a bordered popup, clamped to its inner width.
fn popup_cursor_x(area: Rect, cursor: usize) -> u16 {
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::task::parse_due_timestamp;

    fn seeded(dir: &std::path::Path) -> (FileStore, ContextId) {
        let store = FileStore::new(dir);
        let ctx = ContextId::parse("family").unwrap();
        let due = |s: &str| parse_due_timestamp(s).unwrap();
        let db = Database {
            tasks: vec![
                Task::new("t-1", "Walk the dog").with_priority(Priority::High).with_tag("dog"),
                Task::new("t-2", "Vet appointment")
                    .with_priority(Priority::Critical)
                    .with_due(due("2024-04-02"))
                    .with_tag("dog")
                    .with_tag("family"),
                Task::new("t-3", "Meal plan").with_priority(Priority::Medium).with_tag("meals"),
                Task::new("t-4", "Old chore").with_status(Status::Completed).with_tag("garden"),
            ],
        };
        store.save(&ctx, &db).unwrap();
        (store, ctx)
    }

    fn app(dir: &std::path::Path) -> App {
        let (store, ctx) = seeded(dir);
        App::new(store, ctx, DashboardConfig::default(), None).unwrap()
    }

    fn ids(app: &App) -> Vec<&str> {
        app.view().visible.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn starts_with_ranked_active_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        assert_eq!(ids(&app), vec!["t-2", "t-1", "t-3"]);
        assert_eq!(app.selected_task().unwrap().id, "t-2");
    }

    #[test]
    fn cycles_through_active_domains() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert_eq!(app.known_domains(), vec!["dog", "family", "meals"]);
        let now = Instant::now();
        app.handle_key(KeyCode::Char('d'), now).unwrap();
        assert_eq!(app.domain(), Some("dog"));
        assert_eq!(ids(&app), vec!["t-2", "t-1"]);
        app.handle_key(KeyCode::Char('d'), now).unwrap();
        app.handle_key(KeyCode::Char('d'), now).unwrap();
        assert_eq!(app.domain(), Some("meals"));
        app.handle_key(KeyCode::Char('d'), now).unwrap();
        assert_eq!(app.domain(), None);
        assert_eq!(app.view().active_count, 3);
    }

    #[test]
    fn search_applies_only_after_quiet_period() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let start = Instant::now();
        app.handle_key(KeyCode::Char('/'), start).unwrap();
        assert_eq!(app.state(), AppState::Search);
        app.handle_key(KeyCode::Char('m'), start).unwrap();
        app.handle_key(KeyCode::Char('e'), start + Duration::from_millis(50)).unwrap();
        app.handle_key(KeyCode::Char('a'), start + Duration::from_millis(100)).unwrap();

        // The deadline of the first keystroke passes, but it was superseded.
        app.tick(start + Duration::from_millis(300));
        assert_eq!(app.applied_query(), "");
        assert_eq!(ids(&app).len(), 3);

        app.tick(start + Duration::from_millis(350));
        assert_eq!(app.applied_query(), "mea");
        assert_eq!(ids(&app), vec!["t-3"]);

        app.handle_key(KeyCode::Esc, start + Duration::from_millis(400)).unwrap();
        assert_eq!(app.applied_query(), "");
        assert_eq!(app.state(), AppState::Todo);
    }

    #[test]
    fn enter_flushes_pending_search() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        let now = Instant::now();
        app.handle_key(KeyCode::Char('/'), now).unwrap();
        for c in "vet".chars() {
            app.handle_key(KeyCode::Char(c), now).unwrap();
        }
        app.handle_key(KeyCode::Enter, now).unwrap();
        assert_eq!(app.applied_query(), "vet");
        assert_eq!(ids(&app), vec!["t-2"]);
    }

    #[test]
    fn completing_persists_and_hides_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.handle_key(KeyCode::Char(' '), Instant::now()).unwrap();
        assert_eq!(ids(&app), vec!["t-1", "t-3"]);

        let (store, ctx) = (FileStore::new(dir.path()), ContextId::parse("family").unwrap());
        let db = store.load(&ctx).unwrap();
        assert_eq!(db.get("t-2").unwrap().status, Status::Completed);
    }

    #[test]
    fn quick_add_tags_with_current_domain() {
        let dir = tempfile::tempdir().unwrap();
        let (store, ctx) = seeded(dir.path());
        let mut app = App::new(store, ctx, DashboardConfig::default(), Some("Meals".into())).unwrap();
        let now = Instant::now();
        app.handle_key(KeyCode::Char('a'), now).unwrap();
        for c in "Buy eggs".chars() {
            app.handle_key(KeyCode::Char(c), now).unwrap();
        }
        app.handle_key(KeyCode::Enter, now).unwrap();
        assert_eq!(app.state(), AppState::Todo);
        let added = app.view().visible.iter().find(|t| t.title == "Buy eggs").unwrap();
        assert_eq!(added.id, "t-5");
        assert!(added.has_tag("meals"));
        assert_eq!(app.view().active_count, 2);
    }

    #[test]
    fn quit_key_ends_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert!(app.handle_key(KeyCode::Char('q'), Instant::now()).unwrap());
    }

    #[test]
    fn popup_cursor_stays_inside_box() {
        let area = Rect::new(10, 5, 40, 3);
        assert_eq!(popup_cursor_x(area, 0), 11);
        assert_eq!(popup_cursor_x(area, 5), 16);
        assert_eq!(popup_cursor_x(area, 70_000), 48);
        assert_eq!(popup_cursor_x(area, usize::MAX), 48);
    }
}
