//! Enumerations for dashboard state management.

/// Which screen or overlay currently owns keyboard input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Todo,
    Search,
    QuickAdd,
    Help,
}
