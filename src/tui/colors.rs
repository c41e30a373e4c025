//! Color constants for the dashboard.

use ratatui::style::Color;

use crate::fields::Priority;

pub const CRITICAL_RED: Color = Color::Rgb(178, 34, 34);
pub const HIGH_AMBER: Color = Color::Rgb(255, 176, 0);
pub const MEDIUM_TEAL: Color = Color::Rgb(0, 128, 128);
pub const LOW_SLATE: Color = Color::Rgb(112, 128, 144);
/// Header and status bar background.
pub const HEARTH_ORANGE: Color = Color::Rgb(204, 85, 0);

/// Foreground colour for a task row by priority.
pub fn priority_color(p: Option<Priority>) -> Color {
    match p {
        Some(Priority::Critical) => CRITICAL_RED,
        Some(Priority::High) => HIGH_AMBER,
        Some(Priority::Medium) => MEDIUM_TEAL,
        Some(Priority::Low) => LOW_SLATE,
        None => Color::White,
    }
}
