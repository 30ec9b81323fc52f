//! Header component — clock title, the last status lines and what is playing.

use chrono::{DateTime, Local};
use ratatui::crossterm::event::MouseEvent;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::{AppState, RemoteState},
    component::Component,
    theme::{style_default, style_muted, style_playing, style_secondary, C_BADGE_ERR, C_BADGE_LIVE, C_MUTED},
    widgets::pane_chrome::{pane_chrome, Badge},
};

/// Rows the header needs: three status lines inside a border.
pub const HEADER_HEIGHT: u16 = 5;

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

/// `--- Plier [03:04:05] ---`, 12-hour clock.
pub fn title_text(now: DateTime<Local>) -> String {
    format!("--- Plier [{}] ---", now.format("%I:%M:%S"))
}

/// Right-hand badge: browse mode plus remote state.
pub fn badge_text(state: &AppState) -> String {
    format!("{} · {}", state.mode.label(), state.remote.label())
}

impl Component for Header {
    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let title = title_text(Local::now());
        let badge = badge_text(state);
        let color = match state.remote {
            RemoteState::Connected => C_BADGE_LIVE,
            RemoteState::Lost => C_BADGE_ERR,
            RemoteState::Disabled => C_MUTED,
        };
        let mut block = pane_chrome(
            &title,
            true,
            Some(Badge {
                text: &badge,
                color,
            }),
        );
        if let Some(item) = &state.now_playing {
            block = block.title_bottom(Line::from(vec![
                Span::styled(" ▶ ", style_playing()),
                Span::styled(format!("{} ", item), style_secondary()),
            ]));
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = if state.status.is_empty() {
            vec![Line::from(Span::styled(
                format!(" {}", state.cwd.display()),
                style_muted(),
            ))]
        } else {
            state
                .status
                .iter()
                .map(|s| Line::from(Span::styled(format!(" {}", s), style_default())))
                .collect()
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
