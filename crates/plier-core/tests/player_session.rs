//! Player lifecycle against real processes.
//!
//! `tee <item>` stands in for the media player: it stays alive reading stdin
//! and copies every control byte into the item file, so the bytes the
//! controller wrote can be read back.  `true` stands in for a player that
//! exits on its own.
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use plier_core::config::Config;
use plier_core::player::{Control, PlayerController, PlayerError};

fn controller(executable: &str) -> PlayerController {
    let mut config = Config::default();
    config.player.executable = executable.to_string();
    config.browse.media_suffixes = ".mkv,.mp4".to_string();
    PlayerController::new(&config)
}

async fn read_eventually(path: &Path, expected: &str) -> String {
    let mut content = String::new();
    for _ in 0..100 {
        content = std::fs::read_to_string(path).unwrap_or_default();
        if content == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    content
}

#[tokio::test]
async fn send_control_without_session_is_not_playing() {
    let mut player = controller("tee");
    let err = player.send_control(Control::PlayPause).await.unwrap_err();
    assert!(matches!(err, PlayerError::NotPlaying));
    assert!(matches!(player.play().await, Err(PlayerError::NotPlaying)));
    assert!(matches!(player.pause().await, Err(PlayerError::NotPlaying)));
    assert!(!player.is_live());
}

#[tokio::test]
async fn start_twice_leaves_one_live_session() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.mkv");
    let second = dir.path().join("second.mkv");
    let mut player = controller("tee");

    player.start(&first).await.unwrap();
    let first_pid = player.pid().unwrap();
    assert_eq!(player.now_playing(), Some(first.as_path()));

    player.start(&second).await.unwrap();
    assert!(player.is_live());
    assert_eq!(player.now_playing(), Some(second.as_path()));
    assert_ne!(player.pid().unwrap(), first_pid);

    player.stop().await.unwrap();
    assert!(!player.is_live());
}

#[tokio::test]
async fn control_bytes_reach_player_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let item = dir.path().join("movie.mkv");
    let mut player = controller("tee");

    player.start(&item).await.unwrap();
    player.play().await.unwrap();
    assert_eq!(read_eventually(&item, "p").await, "p");

    player.pause().await.unwrap();
    assert_eq!(read_eventually(&item, "pp").await, "pp");

    player.stop().await.unwrap();
}

#[tokio::test]
async fn stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = controller("tee");

    player.stop().await.unwrap();
    player.start(&dir.path().join("a.mkv")).await.unwrap();
    player.stop().await.unwrap();
    player.stop().await.unwrap();
    assert!(!player.is_live());
    assert!(player.now_playing().is_none());
    assert!(matches!(
        player.send_control(Control::Quit).await,
        Err(PlayerError::NotPlaying)
    ));
}

#[tokio::test]
async fn stop_after_player_exited_clears_session() {
    let mut player = controller("true");
    player.start(Path::new("ignored.mkv")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    player.stop().await.unwrap();
    assert!(!player.is_live());
}

#[tokio::test]
async fn control_after_player_exited_is_not_playing() {
    let mut player = controller("true");
    player.start(Path::new("ignored.mkv")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(matches!(player.play().await, Err(PlayerError::NotPlaying)));
    assert!(!player.is_live());
    assert!(player.now_playing().is_none());
    assert!(matches!(player.pause().await, Err(PlayerError::NotPlaying)));
}

#[tokio::test]
async fn reap_detects_player_exit() {
    let mut player = controller("true");
    player.start(Path::new("ignored.mkv")).await.unwrap();

    let mut status = None;
    for _ in 0..100 {
        status = player.reap();
        if status.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(status.unwrap().success());
    assert!(!player.is_live());
    assert!(player.reap().is_none());
}

#[tokio::test]
async fn launch_failure_is_reported() {
    let mut player = controller("/no/such/player-binary");
    let err = player.start(Path::new("movie.mkv")).await.unwrap_err();
    assert!(matches!(err, PlayerError::Launch { .. }));
    assert!(!player.is_live());
}

#[tokio::test]
async fn abandon_kills_without_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let mut player = controller("tee");
    player.start(&dir.path().join("a.mkv")).await.unwrap();
    player.abandon();
    assert!(!player.is_live());
}
