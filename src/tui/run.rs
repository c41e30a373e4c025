//! Dashboard entry point and terminal setup.

use std::io;

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::error::HearthError;
use crate::tui::app::App;

/// Put the terminal into raw mode, run the dashboard, and restore the terminal
/// even when the app or the terminal setup fails.
pub fn run_dashboard(mut app: App) -> Result<(), HearthError> {
    enable_raw_mode()?;
    let result = execute!(io::stdout(), EnterAlternateScreen)
        .and_then(|_| Terminal::new(CrosstermBackend::new(io::stdout())))
        .map_err(HearthError::from)
        .and_then(|mut terminal| app.run(&mut terminal));

    settle(result, restore_terminal())
}

/// Undo every step of the setup, carrying on past individual failures.
fn restore_terminal() -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(io::stdout(), LeaveAlternateScreen, Show);
    raw.and(screen)
}

/// The dashboard's own error wins over a failure to restore the terminal.
fn settle(result: Result<(), HearthError>, restored: io::Result<()>) -> Result<(), HearthError> {
    match (result, restored) {
        (Err(e), Err(restore)) => {
            tracing::warn!(error = %restore, "failed to restore terminal");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), restored) => restored.map_err(HearthError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn broken_tty() -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "tty gone"))
    }

    #[test]
    fn dashboard_error_survives_failed_restore() {
        let result = Err(HearthError::Store(StoreError::TaskNotFound("t-1".into())));
        let err = settle(result, broken_tty()).unwrap_err();
        assert!(matches!(err, HearthError::Store(StoreError::TaskNotFound(id)) if id == "t-1"));
    }

    #[test]
    fn restore_failure_reported_after_clean_exit() {
        assert!(matches!(settle(Ok(()), broken_tty()), Err(HearthError::Terminal(_))));
        assert!(settle(Ok(()), Ok(())).is_ok());
    }
}
