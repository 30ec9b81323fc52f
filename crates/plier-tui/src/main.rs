mod action;
mod app;
mod app_state;
mod cli;
mod component;
mod components;
mod core;
mod focus;
mod remote;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use plier_core::config::Config;
use plier_core::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    std::fs::create_dir_all(platform::data_dir())?;
    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("plier log: {}", log_path.display());

    tracing::info!("plier starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config: {}, using defaults", e);
        Config::default()
    });
    cli.apply(&mut config);

    let start = cli.start_dir()?;
    tracing::info!("start directory {}", start.display());

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let (dispatcher, feeds) = start_dispatcher(start, &config);
    app::App::new(dispatcher).run(feeds).await?;

    Ok(())
}

/// Open the remote bus when enabled and build the Dispatcher around it.  A
/// bus that fails to open leaves a status line and the app runs without it.
fn start_dispatcher(
    start: PathBuf,
    config: &Config,
) -> (core::Dispatcher, Option<remote::RemoteFeeds>) {
    if !config.remote.enabled {
        return (core::Dispatcher::new(start, config, None), None);
    }
    match remote::CecClient::spawn(&config.remote) {
        Ok((bus, feeds)) => {
            remote::greet(&bus, &config.remote);
            (core::Dispatcher::new(start, config, Some(bus)), Some(feeds))
        }
        Err(e) => {
            tracing::warn!("remote: {}", e);
            let mut dispatcher = core::Dispatcher::new(start, config, None);
            dispatcher.report(format!("remote control disabled: {}", e));
            (dispatcher, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::RemoteState;

    #[tokio::test]
    async fn test_missing_bus_adapter_degrades_to_status_line() {
        let mut config = Config::default();
        config.remote.enabled = true;
        config.remote.client = "/no/such/cec-client".to_string();

        let (dispatcher, feeds) = start_dispatcher(std::env::temp_dir(), &config);
        assert!(feeds.is_none());
        assert_eq!(dispatcher.state().remote, RemoteState::Disabled);
        assert_eq!(
            dispatcher.state().status.last(),
            Some("remote control disabled: /no/such/cec-client not found")
        );
    }

    #[tokio::test]
    async fn test_remote_off_starts_quietly() {
        let mut config = Config::default();
        config.remote.enabled = false;

        let (dispatcher, feeds) = start_dispatcher(std::env::temp_dir(), &config);
        assert!(feeds.is_none());
        assert_eq!(dispatcher.state().remote, RemoteState::Disabled);
        assert!(dispatcher.state().status.is_empty());
    }
}
