//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::TaskPriority;

/// Selection accent for the focused column and card.
pub const ACCENT: Color = Color::Rgb(0, 120, 200);

/// Urgent priority marker.
pub const URGENT_RED: Color = Color::Rgb(200, 40, 40);
/// High priority marker.
pub const HIGH_ORANGE: Color = Color::Rgb(220, 140, 0);
/// Medium priority marker.
pub const MEDIUM_BLUE: Color = Color::Rgb(60, 120, 220);
/// Low priority marker.
pub const LOW_GRAY: Color = Color::Rgb(130, 130, 130);

/// Marker color for a task's priority.
pub fn priority_color(priority: TaskPriority) -> Color {
    match priority {
        TaskPriority::Urgent => URGENT_RED,
        TaskPriority::High => HIGH_ORANGE,
        TaskPriority::Medium => MEDIUM_BLUE,
        TaskPriority::Low => LOW_GRAY,
    }
}
