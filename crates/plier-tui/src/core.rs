/// Dispatcher — single owner of all mutable application state.
///
/// Remote-bus events, UI intents and heartbeat ticks all arrive through the
/// App's one inbox and are handed here one at a time, in arrival order.  The
/// Dispatcher owns the `Navigator`, the `PlayerController` and the
/// `AppState` exclusively; components only ever see `&AppState`.
///
/// `handle()` returns whether anything visible changed, so the App can
/// coalesce redraws.
use std::path::{Path, PathBuf};
use std::process::Stdio;

use plier_core::cec::{QueryReplies, RemoteEvent, RemoteKey};
use plier_core::config::Config;
use plier_core::nav::{ListingEntry, NavError, Navigator};
use plier_core::player::{Control, PlayerController, PlayerError};
use tracing::{debug, info, trace, warn};

use crate::app_state::{AppState, RemoteState};
use crate::remote::BusHandle;

// ── events ────────────────────────────────────────────────────────────────────

/// Something the user asked for through the terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    Play,
    Pause,
    Stop,
    Reload,
    EnterDirectory(String),
    GoUp,
    SelectItem(ListingEntry),
}

/// All inputs into the Dispatcher.
#[derive(Debug)]
pub enum DispatchEvent {
    /// A decoded frame from the remote bus.
    Remote(RemoteEvent),
    /// Notice text from the bus adapter.
    BusCommand(String),
    /// Key code the bus adapter decoded on its own.
    BusKeyPress(u8),
    /// One-second tick.
    Heartbeat,
    /// The bus adapter went away.
    RemoteClosed,
    Ui(UiIntent),
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

pub struct Dispatcher {
    nav: Navigator,
    player: PlayerController,
    bus: Option<BusHandle>,
    /// `Some` when identification queries are answered.
    replies: Option<QueryReplies>,
    poll_address: u8,
    /// Set by the first playable selection; bus polls run while set.
    polling: bool,
    opener: String,
    state: AppState,
}

impl Dispatcher {
    pub fn new(start: PathBuf, config: &Config, bus: Option<BusHandle>) -> Self {
        let nav = Navigator::new(start.clone(), config);
        let mut state = AppState::new(start, nav.mode());
        state.remote = if bus.is_some() {
            RemoteState::Connected
        } else {
            RemoteState::Disabled
        };
        Self {
            nav,
            player: PlayerController::new(config),
            bus,
            replies: config
                .remote
                .reply_to_queries
                .then(|| QueryReplies::from_config(&config.remote)),
            poll_address: config.remote.poll_address,
            polling: false,
            opener: config.player.opener.clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_live()
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Append a line to the status log.
    pub fn report(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("status: {}", line);
        self.state.status.push(line);
    }

    /// Build both listings for the start directory.  Failure is reported,
    /// not fatal: the panes just stay empty.
    pub fn load_initial(&mut self) {
        if let Err(e) = self.refresh() {
            self.report(e.to_string());
        }
    }

    /// React to one event.  Returns `true` when a redraw is needed.
    pub async fn handle(&mut self, event: DispatchEvent) -> bool {
        match event {
            DispatchEvent::Remote(event) => self.on_remote(event).await,
            DispatchEvent::Ui(intent) => self.on_intent(intent).await,
            DispatchEvent::BusCommand(text) => {
                debug!("remote command: {}", text);
                false
            }
            DispatchEvent::BusKeyPress(code) => {
                // The same press also arrives as a 44 frame; that one is acted on.
                debug!("remote key press: {:02x}", code);
                false
            }
            DispatchEvent::Heartbeat => self.on_heartbeat(),
            DispatchEvent::RemoteClosed => {
                if self.bus.take().is_none() {
                    return false;
                }
                warn!("remote: adapter gone");
                self.polling = false;
                self.state.remote = RemoteState::Lost;
                self.report("remote control disconnected");
                true
            }
        }
    }

    /// Quit-time teardown.  Does not wait for the player to die.
    pub fn shutdown(&mut self) {
        self.player.abandon();
    }

    // ── remote ────────────────────────────────────────────────────────────────

    async fn on_remote(&mut self, event: RemoteEvent) -> bool {
        match event {
            RemoteEvent::KeyPressed(key) => self.on_key(key).await,
            RemoteEvent::VendorButtonUp(code) => {
                self.report(format!("vendor button up: {:02x}", code));
                true
            }
            RemoteEvent::OsdNameRequested(_)
            | RemoteEvent::VendorIdRequested(_)
            | RemoteEvent::PhysicalAddressRequested(_)
            | RemoteEvent::VersionRequested(_) => {
                self.answer_query(&event);
                false
            }
            RemoteEvent::KeyReleased(code) => {
                trace!("remote: key released {:02x}", code);
                false
            }
            RemoteEvent::ActiveSource(code) => {
                debug!("remote: active source {:02x}", code);
                false
            }
            RemoteEvent::Unhandled(raw) => {
                debug!("remote: unhandled frame {}", raw);
                false
            }
        }
    }

    async fn on_key(&mut self, key: RemoteKey) -> bool {
        match key {
            RemoteKey::Play | RemoteKey::Pause => self.control(Control::PlayPause).await,
            RemoteKey::Stop => self.stop().await,
            other => {
                // Unhandled keys print as "key unhandled: <hex>".
                self.report(other.to_string());
                true
            }
        }
    }

    fn answer_query(&mut self, event: &RemoteEvent) {
        let (Some(replies), Some(bus)) = (&self.replies, &self.bus) else {
            debug!("remote: query {:?} not answered", event);
            return;
        };
        if let Some(frame) = replies.reply(event) {
            debug!(
                "remote: answering {:?} to {:x} with {}",
                event,
                frame.destination(),
                frame
            );
            if let Err(e) = bus.transmit(&frame) {
                warn!("remote: reply not sent: {}", e);
            }
        }
    }

    // ── ui ────────────────────────────────────────────────────────────────────

    async fn on_intent(&mut self, intent: UiIntent) -> bool {
        match intent {
            UiIntent::Play | UiIntent::Pause => self.control(Control::PlayPause).await,
            UiIntent::Stop => self.stop().await,
            UiIntent::Reload => {
                if let Err(e) = self.refresh() {
                    self.report(e.to_string());
                }
                true
            }
            UiIntent::EnterDirectory(name) => {
                let previous = self.nav.current_path().to_path_buf();
                self.nav.enter_directory(&name);
                self.refresh_or_restore(previous);
                true
            }
            UiIntent::GoUp => {
                let previous = self.nav.current_path().to_path_buf();
                self.nav.go_up();
                self.refresh_or_restore(previous);
                true
            }
            UiIntent::SelectItem(entry) => {
                if self.player.supports(&entry.path) {
                    self.play_item(&entry).await;
                } else {
                    self.open_item(&entry);
                }
                true
            }
        }
    }

    async fn play_item(&mut self, entry: &ListingEntry) {
        match self.player.start(&entry.path).await {
            Ok(()) => {
                self.state.now_playing = Some(entry.label.clone());
                self.report(format!("play: {}", entry.label));
                if !self.polling && self.bus.is_some() {
                    debug!("remote: polling started");
                }
                self.polling = true;
            }
            Err(e) => {
                // The old session is gone even when the new one failed.
                self.state.now_playing = None;
                self.report(e.to_string());
            }
        }
    }

    fn open_item(&mut self, entry: &ListingEntry) {
        info!("open: {} {:?}", self.opener, entry.path);
        match open_with(&self.opener, &entry.path) {
            Ok(()) => self.report(format!("open: {}", entry.label)),
            Err(e) => self.report(format!("cannot open {}: {}", entry.label, e)),
        }
    }

    // ── player ────────────────────────────────────────────────────────────────

    /// Play and pause share one toggle byte; success is silent.
    async fn control(&mut self, control: Control) -> bool {
        match self.player.send_control(control).await {
            Ok(()) => false,
            Err(PlayerError::NotPlaying) => {
                self.state.now_playing = None;
                self.report("not playing");
                true
            }
            Err(e) => {
                self.report(e.to_string());
                true
            }
        }
    }

    async fn stop(&mut self) -> bool {
        self.report("stop");
        let result = self.player.stop().await;
        self.state.now_playing = None;
        if let Err(e) = result {
            self.report(e.to_string());
        }
        true
    }

    fn on_heartbeat(&mut self) -> bool {
        let mut redraw = false;
        if let Some(status) = self.player.reap() {
            debug!("player: reaped ({})", status);
            self.state.now_playing = None;
            self.report("player exited");
            redraw = true;
        }
        if self.polling {
            if let Some(bus) = &self.bus {
                if let Err(e) = bus.poll(self.poll_address) {
                    debug!("remote: poll failed: {}", e);
                }
            }
        }
        redraw
    }

    // ── navigation ────────────────────────────────────────────────────────────

    fn refresh(&mut self) -> Result<(), NavError> {
        let directories = self.nav.list_directories()?;
        let files = self.nav.refresh_listing()?;
        self.state.cwd = self.nav.current_path().to_path_buf();
        self.state.directories = directories;
        self.state.files = files;
        self.state.listing_rev += 1;
        Ok(())
    }

    fn refresh_or_restore(&mut self, previous: PathBuf) {
        if let Err(e) = self.refresh() {
            warn!("nav: {}", e);
            self.nav.set_current(previous);
            self.report(e.to_string());
        }
    }
}

/// Hand `path` to the OS default-open command without waiting for it.
fn open_with(opener: &str, path: &Path) -> std::io::Result<()> {
    let child = tokio::process::Command::new(opener)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    debug!("open: pid {:?}", child.id());
    Ok(())
}
