//! Player controller — owns at most one external media-player process.
//!
//! The player is opaque: it is launched as `<executable> <item>` and driven
//! only by single bytes written to its stdin.  Its output is discarded.
//!
//! ```text
//!   Idle ──start()──▶ Live { child, stdin, item }
//!    ▲                  │
//!    └──stop()/reap()───┘   start() while Live stops the old session first
//! ```

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::filter::FileTypeFilter;

/// Control codes understood by the player on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Toggles between playing and paused.
    PlayPause,
    Quit,
}

impl Control {
    pub fn byte(self) -> u8 {
        match self {
            Self::PlayPause => b'p',
            Self::Quit => b'q',
        }
    }
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("not playing")]
    NotPlaying,
    #[error("cannot launch {executable}: {source}")]
    Launch {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open input of {executable}")]
    NoInput { executable: String },
    #[error("write to player failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("cannot stop player: {0}")]
    Kill(#[source] std::io::Error),
}

pub struct LiveSession {
    child: Child,
    stdin: ChildStdin,
    item: PathBuf,
}

/// Either nothing is playing, or exactly one process with an open stdin.
pub enum PlayerSession {
    Idle,
    Live(LiveSession),
}

pub struct PlayerController {
    executable: String,
    filter: FileTypeFilter,
    session: PlayerSession,
}

impl PlayerController {
    pub fn new(config: &Config) -> Self {
        Self {
            executable: config.player.executable.clone(),
            filter: config.file_type_filter(),
            session: PlayerSession::Idle,
        }
    }

    /// Whether `item` is something the player should be given.
    pub fn supports(&self, item: &Path) -> bool {
        self.filter.matches(&item.to_string_lossy())
    }

    pub fn is_live(&self) -> bool {
        matches!(self.session, PlayerSession::Live(_))
    }

    pub fn now_playing(&self) -> Option<&Path> {
        match &self.session {
            PlayerSession::Live(live) => Some(&live.item),
            PlayerSession::Idle => None,
        }
    }

    /// OS process id of the live player.
    pub fn pid(&self) -> Option<u32> {
        match &self.session {
            PlayerSession::Live(live) => live.child.id(),
            PlayerSession::Idle => None,
        }
    }

    /// Launch the player on `item`, stopping any live session first.
    pub async fn start(&mut self, item: &Path) -> Result<(), PlayerError> {
        if self.is_live() {
            self.stop().await?;
        }

        info!("player: launching {} {:?}", self.executable, item);
        let mut child = Command::new(&self.executable)
            .arg(item)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::Launch {
                executable: self.executable.clone(),
                source,
            })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.start_kill();
            return Err(PlayerError::NoInput {
                executable: self.executable.clone(),
            });
        };

        self.session = PlayerSession::Live(LiveSession {
            child,
            stdin,
            item: item.to_path_buf(),
        });
        Ok(())
    }

    /// Write one control byte to the live player.
    ///
    /// A player that exited since the last `reap()` is cleared here and
    /// reported as `NotPlaying`, not as a broken pipe.
    pub async fn send_control(&mut self, control: Control) -> Result<(), PlayerError> {
        let PlayerSession::Live(live) = &mut self.session else {
            return Err(PlayerError::NotPlaying);
        };
        debug!("player: control {:?}", control);
        let written = match live.stdin.write_all(&[control.byte()]).await {
            Ok(()) => live.stdin.flush().await,
            Err(e) => Err(e),
        };
        let Err(e) = written else {
            return Ok(());
        };
        match live.child.try_wait() {
            Ok(Some(status)) => {
                info!("player: exited ({}) before {:?}", status, control);
                self.session = PlayerSession::Idle;
                Err(PlayerError::NotPlaying)
            }
            _ => Err(PlayerError::Write(e)),
        }
    }

    pub async fn play(&mut self) -> Result<(), PlayerError> {
        self.send_control(Control::PlayPause).await
    }

    pub async fn pause(&mut self) -> Result<(), PlayerError> {
        self.send_control(Control::PlayPause).await
    }

    /// Ask the player to quit, kill it, and forget it.
    ///
    /// The session is cleared no matter what.  A process that already exited
    /// is not an error; a kill that fails on a running process is reported.
    pub async fn stop(&mut self) -> Result<(), PlayerError> {
        let PlayerSession::Live(live) = std::mem::replace(&mut self.session, PlayerSession::Idle)
        else {
            return Ok(());
        };
        let LiveSession {
            mut child,
            mut stdin,
            item,
        } = live;
        info!("player: stopping {:?}", item);

        if let Err(e) = stdin.write_all(&[Control::Quit.byte()]).await {
            warn!("player: quit byte not delivered: {}", e);
        } else if let Err(e) = stdin.flush().await {
            warn!("player: quit byte not flushed: {}", e);
        }
        drop(stdin);

        if let Err(e) = child.kill().await {
            match child.try_wait() {
                Ok(Some(status)) => debug!("player: already exited ({})", status),
                _ => return Err(PlayerError::Kill(e)),
            }
        }
        Ok(())
    }

    /// Clear a session whose process exited on its own.  Never blocks.
    pub fn reap(&mut self) -> Option<ExitStatus> {
        let PlayerSession::Live(live) = &mut self.session else {
            return None;
        };
        match live.child.try_wait() {
            Ok(Some(status)) => {
                info!("player: exited ({})", status);
                self.session = PlayerSession::Idle;
                Some(status)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("player: liveness check failed: {}", e);
                None
            }
        }
    }

    /// Quit-time teardown: signal the process and walk away.
    pub fn abandon(&mut self) {
        if let PlayerSession::Live(mut live) =
            std::mem::replace(&mut self.session, PlayerSession::Idle)
        {
            if let Err(e) = live.child.start_kill() {
                debug!("player: kill on quit: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_bytes() {
        assert_eq!(Control::PlayPause.byte(), b'p');
        assert_eq!(Control::Quit.byte(), b'q');
    }

    #[test]
    fn test_supports_uses_configured_filter() {
        let mut config = Config::default();
        config.browse.media_suffixes = ".mkv,.mp4".to_string();
        let player = PlayerController::new(&config);
        assert!(player.supports(Path::new("/films/movie.mkv")));
        assert!(!player.supports(Path::new("/films/notes.txt")));
        assert!(!player.is_live());
        assert!(player.now_playing().is_none());
    }
}
