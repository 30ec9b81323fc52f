use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::filter::{FileTypeFilter, DEFAULT_MEDIA_SUFFIXES};
use super::nav::BrowseMode;
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Media player executable; launched as `<executable> <item>`.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Command used for files the player does not support.
    #[serde(default = "default_opener")]
    pub opener: String,
}

/// HDMI-CEC remote control settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_enabled")]
    pub enabled: bool,
    /// The libcec command line client used as the bus transport.
    #[serde(default = "default_client")]
    pub client: String,
    /// Adapter port; empty lets the client pick the first adapter it finds.
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_osd_name")]
    pub osd_name: String,
    /// On-screen string sent to the TV once the bus is up.
    #[serde(default = "default_banner")]
    pub banner: String,
    #[serde(default = "default_banner_delay_secs")]
    pub banner_delay_secs: u64,
    /// Logical address polled by the heartbeat and powered on at startup.
    #[serde(default)]
    pub poll_address: u8,
    /// Answer OSD name / vendor id / physical address / version requests.
    #[serde(default)]
    pub reply_to_queries: bool,
    #[serde(default = "default_physical_address")]
    pub physical_address: String,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Walk the tree (true) or list the current directory only (false).
    #[serde(default = "default_walk")]
    pub walk: bool,
    /// Restrict walk results to `media_suffixes`.
    #[serde(default = "default_only_media")]
    pub only_media: bool,
    /// Comma-separated filename suffixes, e.g. `.mkv,.mp4`.
    #[serde(default = "default_media_suffixes")]
    pub media_suffixes: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            opener: default_opener(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: default_remote_enabled(),
            client: default_client(),
            port: String::new(),
            osd_name: default_osd_name(),
            banner: default_banner(),
            banner_delay_secs: default_banner_delay_secs(),
            poll_address: 0,
            reply_to_queries: false,
            physical_address: default_physical_address(),
            vendor_id: default_vendor_id(),
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            walk: default_walk(),
            only_media: default_only_media(),
            media_suffixes: default_media_suffixes(),
        }
    }
}

fn default_executable() -> String {
    "omxplayer".to_string()
}

fn default_opener() -> String {
    platform::default_opener().to_string()
}

fn default_remote_enabled() -> bool {
    true
}

fn default_client() -> String {
    platform::cec_client_binary_name().to_string()
}

fn default_osd_name() -> String {
    "plier".to_string()
}

fn default_banner() -> String {
    "This is Plier".to_string()
}

fn default_banner_delay_secs() -> u64 {
    5
}

fn default_physical_address() -> String {
    "10:00".to_string()
}

fn default_vendor_id() -> String {
    // Pulse-Eight
    "00:15:82".to_string()
}

fn default_walk() -> bool {
    true
}

fn default_only_media() -> bool {
    true
}

fn default_media_suffixes() -> String {
    DEFAULT_MEDIA_SUFFIXES.to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load `path`, writing a default file there first if it does not exist.
    pub fn load_from(path: &PathBuf) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// The suffix filter shared by the walk and the player.
    pub fn file_type_filter(&self) -> FileTypeFilter {
        FileTypeFilter::from_list(&self.browse.media_suffixes)
    }

    pub fn browse_mode(&self) -> BrowseMode {
        if self.browse.walk {
            BrowseMode::RecursiveMediaWalk
        } else {
            BrowseMode::Flat
        }
    }
}
