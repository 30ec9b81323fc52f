//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this, but never mutate it.
//! The Dispatcher is the only thing that writes to AppState.

use std::path::PathBuf;

use plier_core::nav::{BrowseMode, ListingEntry};
use plier_core::status_log::StatusLog;

/// Connection state of the remote-control bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// Turned off in config, or the adapter could not be started.
    Disabled,
    Connected,
    /// The adapter was running and went away.
    Lost,
}

impl RemoteState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "off",
            Self::Connected => "cec",
            Self::Lost => "lost",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory the listings were built from.
    pub cwd: PathBuf,
    pub mode: BrowseMode,
    /// Directory pane entries, `..` first.
    pub directories: Vec<String>,
    /// File pane entries.
    pub files: Vec<ListingEntry>,
    pub status: StatusLog,
    /// Label of the item the player was started on.
    pub now_playing: Option<String>,
    pub remote: RemoteState,
    /// Bumped every time `directories` / `files` are rebuilt.
    pub listing_rev: u64,
}

impl AppState {
    pub fn new(cwd: PathBuf, mode: BrowseMode) -> Self {
        Self {
            cwd,
            mode,
            directories: Vec::new(),
            files: Vec::new(),
            status: StatusLog::new(),
            now_playing: None,
            remote: RemoteState::Disabled,
            listing_rev: 0,
        }
    }
}
