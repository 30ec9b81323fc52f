//! DirList component — left pane: `..` and the sub-directories.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_selected, C_DIRECTORY},
    widgets::{pane_chrome::pane_chrome, scrollable_list::ScrollableList},
};
use ratatui::style::Style;

pub struct DirList {
    pub list: ScrollableList<String>,
}

impl DirList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
        }
    }

    fn enter_selected(&self) -> Vec<Action> {
        match self.list.selected_item() {
            Some(name) => vec![Action::EnterDirectory(name.clone())],
            None => vec![],
        }
    }
}

impl Component for DirList {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(1),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => return self.enter_selected(),
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
            self.list.set_items(state.directories.clone());
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = format!(" {} ", state.cwd.display());
        let block = pane_chrome(&title, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  unreadable", style_muted())),
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
            .map(|(row, name)| {
                let style = if row == sel_in_view {
                    style_selected(focused)
                } else {
                    Style::default().fg(C_DIRECTORY)
                };
                ListItem::new(Line::from(Span::raw(format!(" {}/", name)))).style(style)
            })
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}
