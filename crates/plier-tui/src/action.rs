//! Action enum — all user-initiated intents and internal events.

use plier_core::nav::ListingEntry;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    DirList,
    FileList,
}

/// All actions that can flow through the UI.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    Play,
    Pause,
    Stop,

    // ── Browsing ─────────────────────────────────────────────────────────────
    EnterDirectory(String),
    GoUp,
    SelectItem(ListingEntry),
    Reload,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── System ───────────────────────────────────────────────────────────────
    /// The dispatcher rebuilt one or both listings.
    ListingsChanged,
    Quit,
    Resize(u16, u16),
}
