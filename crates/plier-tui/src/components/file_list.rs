//! FileList component — main pane: the flat listing or the media walk.

use plier_core::nav::ListingEntry;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{style_muted, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::{pane_chrome::pane_chrome, scrollable_list::ScrollableList},
};

pub struct FileList {
    pub list: ScrollableList<ListingEntry>,
}

impl FileList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
        }
    }
}

impl Component for FileList {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => {
                if let Some(entry) = self.list.selected_item() {
                    return vec![Action::SelectItem(entry.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                self.list.handle_click(rel_row);
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if *action == Action::ListingsChanged {
            self.list.set_items(state.files.clone());
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = format!(" {} · {} ", state.mode.label(), self.list.len());
        let block = pane_chrome(&title, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  nothing to play here", style_muted())),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let sel_in_view = self.list.selected_in_view(height);
        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .iter()
            .enumerate()
            .map(|(row, entry)| {
                let is_selected = row == sel_in_view;
                let is_current = state.now_playing.as_deref() == Some(entry.label.as_str());

                let (icon, icon_color) = if is_current {
                    ("▶", C_PLAYING)
                } else {
                    (" ", C_MUTED)
                };
                let name_color = if is_current {
                    C_PLAYING
                } else if is_selected {
                    C_PRIMARY
                } else {
                    C_SECONDARY
                };
                let name_style = if is_selected && focused {
                    Style::default().fg(name_color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(name_color)
                };
                let item_bg = if is_selected {
                    Style::default().bg(C_SELECTION_BG)
                } else {
                    Style::default()
                };

                ListItem::new(Line::from(vec![
                    Span::styled(icon, Style::default().fg(icon_color)),
                    Span::raw(" "),
                    Span::styled(entry.label.clone(), name_style),
                ]))
                .style(item_bg)
            })
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}
