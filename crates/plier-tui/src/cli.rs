//! Command-line flags.  Every flag overrides the matching config value.

use std::path::PathBuf;

use clap::Parser;
use plier_core::config::Config;

#[derive(Debug, Parser)]
#[command(name = "plier", about = "Browse media and play it, from the keyboard or a TV remote")]
pub struct Cli {
    /// Player executable, run as `<player> <file>`
    #[arg(long = "media-player", value_name = "EXE")]
    pub media_player: Option<String>,

    /// Listen to the TV remote over HDMI-CEC
    #[arg(long, value_name = "BOOL")]
    pub cec: Option<bool>,

    /// List files below the current directory recursively instead of flat
    #[arg(long, value_name = "BOOL")]
    pub walk: Option<bool>,

    /// In walk mode, list only files with a media suffix
    #[arg(long = "only-media", value_name = "BOOL")]
    pub only_media: Option<bool>,

    /// Comma-separated media suffixes, e.g. ".mkv,.mp4"
    #[arg(long = "media-suffixes", value_name = "LIST")]
    pub media_suffixes: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to start in (default: current directory)
    pub dir: Option<PathBuf>,
}

impl Cli {
    /// Fold the flags that were given into `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(player) = &self.media_player {
            config.player.executable = player.clone();
        }
        if let Some(cec) = self.cec {
            config.remote.enabled = cec;
        }
        if let Some(walk) = self.walk {
            config.browse.walk = walk;
        }
        if let Some(only_media) = self.only_media {
            config.browse.only_media = only_media;
        }
        if let Some(suffixes) = &self.media_suffixes {
            config.browse.media_suffixes = suffixes.clone();
        }
    }

    /// The start directory, absolute.  Falls back to the working directory.
    pub fn start_dir(&self) -> std::io::Result<PathBuf> {
        match &self.dir {
            Some(dir) => dir.canonicalize(),
            None => std::env::current_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "plier",
            "--media-player",
            "mpv",
            "--cec",
            "false",
            "--walk=false",
            "--media-suffixes",
            ".mkv",
            "/films",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.player.executable, "mpv");
        assert!(!config.remote.enabled);
        assert!(!config.browse.walk);
        assert!(config.browse.only_media);
        assert_eq!(config.browse.media_suffixes, ".mkv");
        assert_eq!(cli.dir, Some(PathBuf::from("/films")));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["plier"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.player.executable, Config::default().player.executable);
        assert!(cli.dir.is_none());
        assert_eq!(cli.start_dir().unwrap(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_missing_start_dir_is_an_error() {
        let cli = Cli::parse_from(["plier", "/no/such/dir/for/plier"]);
        assert!(cli.start_dir().is_err());
    }
}
