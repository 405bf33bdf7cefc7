//! Theme and Colors
//!
//! A quiet reading palette: narration in soft gray that brightens when its
//! step is active, charts in muted teal with a warm highlight.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Narration
// ============================================================================

/// Narration text outside the active step
pub const TEXT: Color = Color::Rgb(150, 150, 150);

/// Narration text of the active step
pub const TEXT_ACTIVE: Color = Color::Rgb(240, 240, 240);

/// Marker drawn beside the active step
pub const ACTIVE_MARKER: Color = Color::Rgb(255, 196, 110);

/// Section headings
pub const HEADING: Color = Color::Rgb(130, 190, 255);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

// ============================================================================
// Graphics
// ============================================================================

/// Bars that are not highlighted
pub const BAR: Color = Color::Rgb(90, 160, 160);

/// The highlighted bar
pub const BAR_HIGHLIGHT: Color = Color::Rgb(255, 160, 90);

/// Step progress gauge
pub const GAUGE: Color = Color::Rgb(120, 230, 120);

/// Graphic panel border
pub const BORDER: Color = Color::Rgb(70, 70, 80);

// ============================================================================
// Status Line
// ============================================================================

/// Status line background
pub const STATUS_BG: Color = Color::Rgb(35, 35, 45);

/// Status line text
pub const STATUS_FG: Color = Color::Rgb(200, 200, 210);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Style for a narration line
#[must_use]
pub fn narration(active: bool) -> Style {
    if active {
        Style::default().fg(TEXT_ACTIVE)
    } else {
        Style::default().fg(TEXT)
    }
}

/// Style for a section heading
#[must_use]
pub fn heading() -> Style {
    Style::default().fg(HEADING).add_modifier(Modifier::BOLD)
}
