//! Component trait — the interface every UI panel implements.
//!
//! - Components own their own cursor/scroll state and render themselves.
//! - Components receive `AppState` (read-only) for data they don't own.
//! - Components produce `Vec<Action>`; they never mutate shared state directly.

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use crate::action::Action;
use crate::app_state::AppState;

pub trait Component {
    /// Handle a key event. Returns actions to be dispatched.
    /// Only called when this component has focus.
    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    /// Handle a mouse event inside `area`. Returns actions to be dispatched.
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// Receive an action dispatched by the App, focused or not.
    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    /// Render the component into `area`.
    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
