//! Color palette and style constants for the plier TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(18, 18, 18);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_DIRECTORY: Color = Color::Rgb(80, 140, 200);
pub const C_BUTTON: Color = Color::Rgb(100, 160, 130);
pub const C_BADGE_LIVE: Color = Color::Rgb(80, 200, 120);
pub const C_BADGE_ERR: Color = Color::Rgb(255, 95, 95);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_playing() -> Style {
    Style::default().fg(C_PLAYING)
}

pub fn style_selected(focused: bool) -> Style {
    let style = Style::default().bg(C_SELECTION_BG).fg(C_PRIMARY);
    if focused {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
