//! Color palette for the moodplay TUI.

use ratatui::style::Color;

pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_CONNECTING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_NUMBER_HINT: Color = Color::Rgb(90, 90, 115);
pub const C_TAG: Color = Color::Rgb(80, 140, 200);
/// Face box and label on the overlay.
pub const C_FACE: Color = Color::Rgb(0, 255, 0);
