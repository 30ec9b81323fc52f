//! Buttons component — the Play / Pause / Stop column on the right.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{style_default, style_unfocused_border, C_BUTTON},
};
use ratatui::style::Style;

/// Width of the button column, borders included.
pub const BUTTONS_WIDTH: u16 = 10;
/// Rows per button, borders included.
const BUTTON_HEIGHT: u16 = 3;

static BUTTONS: [(&str, Action); 3] = [
    ("Play", Action::Play),
    ("Pause", Action::Pause),
    ("Stop", Action::Stop),
];

pub struct Buttons;

impl Buttons {
    pub fn new() -> Self {
        Self
    }

    /// The button drawn at `row`, counted from the top of the column.
    fn at_row(row: u16) -> Option<&'static Action> {
        BUTTONS
            .get((row / BUTTON_HEIGHT) as usize)
            .map(|(_, action)| action)
    }
}

impl Component for Buttons {
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        Self::at_row(event.row.saturating_sub(area.y))
            .cloned()
            .into_iter()
            .collect()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        for (i, (label, _)) in BUTTONS.iter().enumerate() {
            let y = area.y + i as u16 * BUTTON_HEIGHT;
            if y + BUTTON_HEIGHT > area.y + area.height {
                break;
            }
            let rect = Rect {
                y,
                height: BUTTON_HEIGHT,
                ..area
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(style_unfocused_border());
            let text = Paragraph::new(Span::styled(*label, Style::default().fg(C_BUTTON)))
                .alignment(Alignment::Center)
                .style(style_default())
                .block(block);
            frame.render_widget(text, rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plier_core::nav::BrowseMode;
    use ratatui::crossterm::event::KeyModifiers;

    fn click(row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_click_maps_rows_to_buttons() {
        let state = AppState::new("/".into(), BrowseMode::Flat);
        let area = Rect::new(70, 0, BUTTONS_WIDTH, 20);
        let mut buttons = Buttons::new();
        assert_eq!(buttons.handle_mouse(click(0), area, &state), vec![Action::Play]);
        assert_eq!(buttons.handle_mouse(click(4), area, &state), vec![Action::Pause]);
        assert_eq!(buttons.handle_mouse(click(8), area, &state), vec![Action::Stop]);
        assert!(buttons.handle_mouse(click(9), area, &state).is_empty());
    }
}
