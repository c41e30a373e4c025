//! Command implementations for the CLI interface.
//!
//! Each handler works against a `Session`: the resolved file store, the
//! household context and the loaded configuration.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::config::DashboardConfig;
use crate::context::{discover_contexts, ContextId};
use crate::display::{format_due_relative, format_priority, render_table};
use crate::error::{HearthError, Result, StoreError};
use crate::fields::*;
use crate::rank::{filter_by_domain, rank_refs};
use crate::store::{local_today, parse_due_input, split_and_normalise_tags, FileStore, TaskSource};
use crate::task::Task;
use crate::tui::{app::App, run::run_dashboard};
use crate::view::TodoView;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard.
    Ui {
        /// Start filtered to this domain tag.
        #[arg(long)]
        domain: Option<String>,
    },

    /// Show the to-do widget: the top ranked tasks and the active count.
    Todo {
        /// Only tasks tagged with this domain.
        #[arg(long)]
        domain: Option<String>,
        /// Number of tasks to show (default from config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List tasks in ranked order.
    List {
        /// Only tasks tagged with this domain.
        #[arg(long)]
        domain: Option<String>,
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due: YYYY-MM-DD, "today", "tomorrow 18:00", "in 3d", "next friday".
        #[arg(long)]
        due: Option<String>,
        /// Priority: critical | high | medium | low.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Status: pending | in-progress | completed.
        #[arg(long, value_enum, default_value_t = Status::Pending)]
        status: Status,
    },

    /// Mark a task completed.
    Complete {
        /// Task ID.
        id: String,
    },

    /// Reopen a task (status pending).
    Reopen {
        /// Task ID.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID.
        id: String,
    },

    /// List distinct tags (domains) and counts of active tasks.
    Tags,

    /// List known household contexts.
    Contexts,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolved environment for one CLI invocation.
pub struct Session {
    pub store: FileStore,
    pub context: ContextId,
    pub config: DashboardConfig,
}

impl Session {
    /// Domain from the flag, else the configured default.
    fn domain<'a>(&'a self, flag: &'a Option<String>) -> Option<&'a str> {
        flag.as_deref().or(self.config.default_domain.as_deref())
    }
}

/// Dispatch a parsed command.
pub fn run_command(session: &Session, command: Commands) -> Result<()> {
    match command {
        Commands::Ui { domain } => cmd_ui(session, domain),
        Commands::Todo { domain, limit } => cmd_todo(session, domain, limit),
        Commands::List { domain, all, limit } => cmd_list(session, domain, all, limit),
        Commands::Add { title, desc, tags, due, priority, status } => {
            let id = cmd_add(session, title, desc, tags, due, priority, status, local_today())?;
            println!("Added task {id}");
            Ok(())
        }
        Commands::Complete { id } => cmd_set_status(session, &id, Status::Completed),
        Commands::Reopen { id } => cmd_set_status(session, &id, Status::Pending),
        Commands::Delete { id } => cmd_delete(session, &id),
        Commands::Tags => cmd_tags(session),
        Commands::Contexts => cmd_contexts(session),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Launch the terminal dashboard.
pub fn cmd_ui(session: &Session, domain: Option<String>) -> Result<()> {
    let domain = session.domain(&domain).map(str::to_string);
    let app = App::new(session.store.clone(), session.context.clone(), session.config.clone(), domain)?;
    run_dashboard(app)
}

/// Build the to-do widget for the session.
pub fn todo_view(session: &Session, domain: Option<&str>, limit: Option<usize>) -> Result<TodoView> {
    let tasks = session.store.tasks(&session.context, StatusScope::Active)?;
    Ok(TodoView::build(
        &tasks,
        domain,
        limit.unwrap_or(session.config.todo_limit),
        session.config.due_placement,
    ))
}

/// Text rendering of the to-do widget.
pub fn todo_report(view: &TodoView, today: NaiveDate) -> String {
    let mut out = format!("{}\n", view.title());
    if view.is_empty() {
        out.push_str("  Nothing to do.\n");
        return out;
    }
    for (i, t) in view.visible.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<9} {:<14} {} ({})\n",
            i + 1,
            format_priority(t.priority),
            format_due_relative(t.due_date, today),
            t.title,
            t.id
        ));
    }
    if view.hidden_count() > 0 {
        out.push_str(&format!("  +{} more\n", view.hidden_count()));
    }
    out
}

/// Print the ranked to-do slice for a domain.
pub fn cmd_todo(session: &Session, domain: Option<String>, limit: Option<usize>) -> Result<()> {
    let view = todo_view(session, session.domain(&domain), limit)?;
    print!("{}", todo_report(&view, local_today()));
    Ok(())
}

/// Ranked table of tasks, optionally including completed ones.
pub fn list_report(
    session: &Session,
    domain: Option<&str>,
    all: bool,
    limit: Option<usize>,
    today: NaiveDate,
) -> Result<String> {
    let scope = if all { StatusScope::All } else { StatusScope::Active };
    let tasks = filter_by_domain(&session.store.tasks(&session.context, scope)?, domain);
    let mut refs: Vec<&Task> = tasks.iter().collect();
    rank_refs(&mut refs, session.config.due_placement);
    if let Some(n) = limit {
        refs.truncate(n);
    }
    Ok(render_table(&refs, today))
}

/// Print every ranked task in the domain, optionally including completed ones.
pub fn cmd_list(session: &Session, domain: Option<String>, all: bool, limit: Option<usize>) -> Result<()> {
    let report = list_report(session, session.domain(&domain), all, limit, local_today())?;
    print!("{report}");
    Ok(())
}

/// Add a new task and return its ID.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    session: &Session,
    title: String,
    desc: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    priority: Option<Priority>,
    status: Status,
    today: NaiveDate,
) -> Result<String> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(HearthError::InvalidInput("Title cannot be empty".into()));
    }
    let due_date = match due {
        Some(raw) => Some(
            parse_due_input(&raw, today)
                .ok_or_else(|| HearthError::InvalidInput(format!("Could not parse due date '{raw}'")))?,
        ),
        None => None,
    };

    let mut db = session.store.load(&session.context)?;
    let now = Utc::now().timestamp();
    let mut task = Task::new(db.next_id(), title);
    task.description = desc.filter(|d| !d.trim().is_empty());
    task.tags = split_and_normalise_tags(&tags).into_iter().collect();
    task.due_date = due_date;
    task.priority = priority;
    task.status = status;
    task.created_at_utc = now;
    task.updated_at_utc = now;
    let id = task.id.clone();
    db.tasks.push(task);
    session.store.save(&session.context, &db)?;
    tracing::info!(task = %id, context = %session.context, "added task");
    Ok(id)
}

/// Change a task's status and persist.
pub fn cmd_set_status(session: &Session, id: &str, status: Status) -> Result<()> {
    let mut db = session.store.load(&session.context)?;
    let task = db.get_mut(id).ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
    task.status = status;
    task.updated_at_utc = Utc::now().timestamp();
    session.store.save(&session.context, &db)?;
    tracing::info!(task = %id, ?status, "updated task status");
    Ok(())
}

/// Delete a task by id.
pub fn cmd_delete(session: &Session, id: &str) -> Result<()> {
    let mut db = session.store.load(&session.context)?;
    let removed = db.remove(id)?;
    session.store.save(&session.context, &db)?;
    tracing::info!(task = %id, "deleted task");
    println!("Deleted task {}: {}", removed.id, removed.title);
    Ok(())
}

/// Count active tasks per tag.
pub fn tag_counts(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in tasks.iter().flat_map(|t| t.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Print each tag with the number of active tasks carrying it.
pub fn cmd_tags(session: &Session) -> Result<()> {
    let tasks = session.store.tasks(&session.context, StatusScope::Active)?;
    for (tag, n) in tag_counts(&tasks) {
        println!("{tag:<20} {n}");
    }
    Ok(())
}

/// Print the contexts that have a task file under the root.
pub fn cmd_contexts(session: &Session) -> Result<()> {
    for ctx in discover_contexts(session.store.root())? {
        let marker = if ctx == session.context { "*" } else { " " };
        println!("{} {}", marker, ctx.display_name());
    }
    Ok(())
}

/// Print a shell completion script to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
