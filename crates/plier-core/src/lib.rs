//! Shared core of the plier media browser: configuration, CEC frame
//! decoding, the navigation model and the player controller.

pub mod cec;
pub mod config;
pub mod filter;
pub mod nav;
pub mod platform;
pub mod player;
pub mod status_log;
