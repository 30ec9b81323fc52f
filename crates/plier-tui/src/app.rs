//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and the `Dispatcher` (which owns `AppState`).
//! - One bounded `tokio::mpsc` inbox carries `AppMessage`s in from the
//!   terminal reader, the heartbeat and the remote-bus forwarders.
//! - The loop draws a frame when something changed, then awaits the next
//!   message and drains whatever else is already queued.
//! - Components return `Vec<Action>`; App turns the ones that touch state
//!   into `UiIntent`s for the Dispatcher.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use plier_core::cec;

use crate::{
    action::{Action, ComponentId},
    component::Component,
    components::{
        buttons::{Buttons, BUTTONS_WIDTH},
        dir_list::DirList,
        file_list::FileList,
        header::{Header, HEADER_HEIGHT},
    },
    core::{DispatchEvent, Dispatcher, UiIntent},
    focus::FocusRing,
    remote::RemoteFeeds,
};

// ── Internal event bus ────────────────────────────────────────────────────────

#[derive(Debug)]
enum AppMessage {
    Event(Event),
    Dispatch(DispatchEvent),
}

const INBOX_CAPACITY: usize = 256;
const HEARTBEAT: Duration = Duration::from_secs(1);
const INPUT_POLL: Duration = Duration::from_millis(250);

/// Where each pane was drawn last frame, for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    dir_list: Rect,
    file_list: Rect,
    buttons: Rect,
}

pub struct App {
    dispatcher: Dispatcher,
    focus: FocusRing,
    header: Header,
    dir_list: DirList,
    file_list: FileList,
    buttons: Buttons,
    pane_areas: PaneAreas,
    /// Listing revision the list components were last synced to.
    seen_rev: u64,
    should_quit: bool,
}

impl App {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            focus: FocusRing::default(),
            header: Header::new(),
            dir_list: DirList::new(),
            file_list: FileList::new(),
            buttons: Buttons::new(),
            pane_areas: PaneAreas::default(),
            seen_rev: 0,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, feeds: Option<RemoteFeeds>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, rx) = mpsc::channel::<AppMessage>(INBOX_CAPACITY);
        spawn_producers(&tx, feeds);
        drop(tx);

        self.dispatcher.load_initial();
        self.sync_listings().await;

        let result = self.event_loop(&mut terminal, rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        self.dispatcher.shutdown();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("plier exiting");

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        mut rx: mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        const MAX_DRAIN: usize = 64;
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }

            let Some(msg) = rx.recv().await else {
                debug!("inbox closed");
                break;
            };
            needs_redraw = self.handle_message(msg).await;
            let mut drained = 0;
            while drained < MAX_DRAIN && !self.should_quit {
                let Ok(next) = rx.try_recv() else { break };
                drained += 1;
                needs_redraw |= self.handle_message(next).await;
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    /// Returns `true` if the message requires a redraw.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return false;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a).await;
                    }
                    self.sync_listings().await;
                    true
                }
                Event::Mouse(mouse) => {
                    let actions = self.handle_mouse(mouse);
                    let redraw = !actions.is_empty() || mouse.kind != MouseEventKind::Moved;
                    for a in actions {
                        self.dispatch(a).await;
                    }
                    self.sync_listings().await;
                    redraw
                }
                Event::Resize(w, h) => {
                    self.dispatch(Action::Resize(w, h)).await;
                    true
                }
                _ => false,
            },

            AppMessage::Dispatch(event) => {
                // The header clock ticks with the heartbeat.
                let tick = matches!(event, DispatchEvent::Heartbeat);
                let changed = self.dispatcher.handle(event).await;
                self.sync_listings().await;
                changed || tick
            }
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // Global keys
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return vec![Action::Quit],
                KeyCode::Char('w') => return vec![Action::FocusNext],
                _ => return vec![],
            }
        }
        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('r') => return vec![Action::Reload],
            KeyCode::Char('p') => return vec![Action::Pause],
            KeyCode::Char(' ') => return vec![Action::Play],
            KeyCode::Char('s') => return vec![Action::Stop],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Backspace => return vec![Action::GoUp],
            _ => {}
        }

        // Dispatch to the focused component
        let s = self.dispatcher.state();
        match self.focus.current() {
            Some(ComponentId::DirList) => self.dir_list.handle_key(key, s),
            Some(ComponentId::FileList) => self.file_list.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click {
            return vec![];
        }

        let col = event.column;
        let row = event.row;

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let s = self.dispatcher.state();

        if hit(areas.buttons, col, row) {
            return self.buttons.handle_mouse(event, areas.buttons, s);
        }
        if hit(areas.dir_list, col, row) {
            let mut actions = self.dir_list.handle_mouse(event, areas.dir_list, s);
            if !self.focus.is_focused(ComponentId::DirList) {
                actions.insert(0, Action::FocusPane(ComponentId::DirList));
            }
            return actions;
        }
        if hit(areas.file_list, col, row) {
            let mut actions = self.file_list.handle_mouse(event, areas.file_list, s);
            if !self.focus.is_focused(ComponentId::FileList) {
                actions.insert(0, Action::FocusPane(ComponentId::FileList));
            }
            return actions;
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        trace!("action: {:?}", action);
        match action {
            Action::Play => self.send_intent(UiIntent::Play).await,
            Action::Pause => self.send_intent(UiIntent::Pause).await,
            Action::Stop => self.send_intent(UiIntent::Stop).await,
            Action::Reload => self.send_intent(UiIntent::Reload).await,
            Action::EnterDirectory(name) => self.send_intent(UiIntent::EnterDirectory(name)).await,
            Action::GoUp => self.send_intent(UiIntent::GoUp).await,
            Action::SelectItem(entry) => self.send_intent(UiIntent::SelectItem(entry)).await,
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::ListingsChanged => {
                let s = self.dispatcher.state();
                self.dir_list.on_action(&Action::ListingsChanged, s);
                self.file_list.on_action(&Action::ListingsChanged, s);
            }
            Action::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
            Action::Resize(w, h) => debug!("resize {}x{}", w, h),
        }
    }

    async fn send_intent(&mut self, intent: UiIntent) {
        self.dispatcher.handle(DispatchEvent::Ui(intent)).await;
    }

    /// Announce rebuilt listings to the list components.
    async fn sync_listings(&mut self) {
        let rev = self.dispatcher.state().listing_rev;
        if rev != self.seen_rev {
            self.seen_rev = rev;
            self.dispatch(Action::ListingsChanged).await;
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: main | buttons ──────────────────────────────────────
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(BUTTONS_WIDTH)])
            .split(area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(columns[0]);
        // The directory pane takes a third of the whole width.
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(area.width / 3), Constraint::Min(0)])
            .split(rows[1]);

        self.pane_areas = PaneAreas {
            dir_list: body[0],
            file_list: body[1],
            buttons: columns[1],
        };

        let state = self.dispatcher.state();
        self.header.draw(frame, rows[0], false, state);
        self.dir_list.draw(
            frame,
            body[0],
            self.focus.is_focused(ComponentId::DirList),
            state,
        );
        self.file_list.draw(
            frame,
            body[1],
            self.focus.is_focused(ComponentId::FileList),
            state,
        );
        self.buttons.draw(frame, columns[1], false, state);
    }
}

// ── Producers ─────────────────────────────────────────────────────────────────

/// Start every task that feeds the inbox.  Each owns its own sender clone;
/// none of them touches application state.
fn spawn_producers(tx: &mpsc::Sender<AppMessage>, feeds: Option<RemoteFeeds>) {
    // Keyboard/mouse events.  Polls so the thread exits once the inbox closes.
    let event_tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        while !event_tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(_) => break,
            }
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // Heartbeat
    let heartbeat_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(HEARTBEAT).await;
            if heartbeat_tx
                .send(AppMessage::Dispatch(DispatchEvent::Heartbeat))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let Some(RemoteFeeds {
        frames,
        mut commands,
        mut keys,
    }) = feeds
    else {
        return;
    };

    tokio::spawn(forward_frames(frames, tx.clone()));

    let cmd_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(text) = commands.recv().await {
            if cmd_tx
                .send(AppMessage::Dispatch(DispatchEvent::BusCommand(text)))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let key_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(code) = keys.recv().await {
            if key_tx
                .send(AppMessage::Dispatch(DispatchEvent::BusKeyPress(code)))
                .await
                .is_err()
            {
                break;
            }
        }
    });
}

/// Decode remote frames into the inbox in arrival order.  Noise is dropped;
/// the end of the feed is reported once as `RemoteClosed`.
async fn forward_frames(mut frames: mpsc::Receiver<String>, tx: mpsc::Sender<AppMessage>) {
    while let Some(line) = frames.recv().await {
        let Some(event) = cec::decode(&line) else {
            trace!("remote: ignored {:?}", line);
            continue;
        };
        if tx
            .send(AppMessage::Dispatch(DispatchEvent::Remote(event)))
            .await
            .is_err()
        {
            return;
        }
    }
    let _ = tx
        .send(AppMessage::Dispatch(DispatchEvent::RemoteClosed))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use plier_core::cec::{RemoteEvent, RemoteKey};

    fn remote_event(msg: Option<AppMessage>) -> Option<RemoteEvent> {
        match msg {
            Some(AppMessage::Dispatch(DispatchEvent::Remote(event))) => Some(event),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_forward_frames_drops_noise_and_reports_close() {
        let (line_tx, frames) = mpsc::channel(8);
        let (tx, mut rx) = mpsc::channel(8);
        for line in [
            "garbage",
            ">> 10:44:44",
            ">> 10:zz:45",
            "TRAFFIC: [ 123] << 01:8b:42",
            ">> 10:44:45",
        ] {
            line_tx.send(line.to_string()).await.unwrap();
        }
        drop(line_tx);

        forward_frames(frames, tx).await;

        assert_eq!(
            remote_event(rx.recv().await),
            Some(RemoteEvent::KeyPressed(RemoteKey::Play))
        );
        assert_eq!(
            remote_event(rx.recv().await),
            Some(RemoteEvent::KeyPressed(RemoteKey::Stop))
        );
        assert!(matches!(
            rx.recv().await,
            Some(AppMessage::Dispatch(DispatchEvent::RemoteClosed))
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_listing_changes_reach_both_panes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.mkv"), b"").unwrap();
        std::fs::create_dir(dir.path().join("shows")).unwrap();
        std::fs::write(dir.path().join("shows").join("ep1.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("shows").join("ep2.mkv"), b"").unwrap();

        let mut config = plier_core::config::Config::default();
        config.browse.walk = false;
        config.remote.enabled = false;
        let mut app = App::new(Dispatcher::new(dir.path().to_path_buf(), &config, None));

        app.dispatcher.load_initial();
        app.sync_listings().await;
        assert_eq!(app.dir_list.list.len(), 2);
        assert_eq!(app.file_list.list.len(), 1);

        let enter = DispatchEvent::Ui(UiIntent::EnterDirectory("shows".to_string()));
        assert!(app.handle_message(AppMessage::Dispatch(enter)).await);
        assert_eq!(app.dir_list.list.len(), 1);
        let labels: Vec<&str> = app
            .file_list
            .list
            .items
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["ep1.mkv", "ep2.mkv"]);
    }

    #[tokio::test]
    async fn test_forward_frames_stops_when_inbox_closes() {
        let (line_tx, frames) = mpsc::channel(8);
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        line_tx.send(">> 10:44:44".to_string()).await.unwrap();
        drop(line_tx);

        forward_frames(frames, tx).await;
    }
}
