/// Remote-control bus adapter — drives `cec-client` as a child process.
///
/// ```text
///   CecClient::spawn()
///         │
///         ├── writer_task   ← receives BusRequest via mpsc, writes text commands → stdin
///         ├── reader_task   ← reads stdout lines
///         │                      ├── ">> " traffic   → frames channel
///         │                      ├── "NOTICE:"       → commands channel
///         │                      └── "key pressed:"  → keys channel
///         └── reaper_task   ← owns the child, logs its exit
/// ```
///
/// The adapter never interprets frames; decoding happens downstream.  When
/// `cec-client` exits, its stdout closes, the reader drops all three senders
/// and every consumer sees its channel end.
use std::process::Stdio;

use plier_core::cec::{Frame, RECEIVE_MARKER};
use plier_core::config::RemoteConfig;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// libcec log levels we need: notice (4), traffic (8) and debug (16).
const LOG_MASK: u8 = 4 | 8 | 16;

const FEED_CAPACITY: usize = 64;

/// Logical address of the TV.
const TV_ADDRESS: u8 = 0;

// ── requests ──────────────────────────────────────────────────────────────────

/// Something we ask the bus to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusRequest {
    PowerOn(u8),
    Poll(u8),
    OsdString { address: u8, text: String },
    Transmit(Frame),
}

impl BusRequest {
    /// The `cec-client` stdin command for this request, without newline.
    pub fn to_line(&self) -> String {
        match self {
            Self::PowerOn(address) => format!("on {}", address),
            Self::Poll(address) => format!("poll {}", address),
            Self::OsdString { address, text } => format!("osd {} {}", address, text),
            Self::Transmit(frame) => format!("tx {}", frame.to_wire()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("remote bus closed")]
    Closed,
    #[error("remote bus busy")]
    Busy,
}

/// Cloneable handle to the writer task.  Sending never blocks: a full queue
/// is reported as `Busy` and the request dropped.
#[derive(Clone)]
pub struct BusHandle {
    tx: mpsc::Sender<BusRequest>,
}

impl BusHandle {
    pub fn new(tx: mpsc::Sender<BusRequest>) -> Self {
        Self { tx }
    }

    pub fn send(&self, request: BusRequest) -> Result<(), BusError> {
        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BusError::Busy,
            mpsc::error::TrySendError::Closed(_) => BusError::Closed,
        })
    }

    pub fn power_on(&self, address: u8) -> Result<(), BusError> {
        self.send(BusRequest::PowerOn(address))
    }

    pub fn poll(&self, address: u8) -> Result<(), BusError> {
        self.send(BusRequest::Poll(address))
    }

    pub fn set_osd_string(&self, address: u8, text: &str) -> Result<(), BusError> {
        self.send(BusRequest::OsdString {
            address,
            text: text.to_string(),
        })
    }

    pub fn transmit(&self, frame: &Frame) -> Result<(), BusError> {
        self.send(BusRequest::Transmit(frame.clone()))
    }
}

// ── output classification ─────────────────────────────────────────────────────

/// One interesting line of `cec-client` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusLine {
    /// Received traffic, starting at the receive marker (`>> 01:44:44`).
    Frame(String),
    /// Notice text with the level tag and timestamp stripped.
    Command(String),
    /// Key code libcec reports after its own key decoding.
    KeyPress(u8),
}

/// Sort one stdout line into a feed.  Lines we have no use for (our own
/// transmissions, banners, errors) yield `None`.
pub fn classify_line(line: &str) -> Option<BusLine> {
    let line = line.trim_end();
    if let Some(pos) = line.find(RECEIVE_MARKER) {
        return Some(BusLine::Frame(line[pos..].to_string()));
    }
    if let Some(pos) = line.find("key pressed: ") {
        let rest = &line[pos..];
        let open = rest.find('(')?;
        let close = open + rest[open..].find(')')?;
        return u8::from_str_radix(rest[open + 1..close].trim(), 16)
            .ok()
            .map(BusLine::KeyPress);
    }
    if let Some(rest) = line.strip_prefix("NOTICE:") {
        let text = match rest.find(']') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
        let text = text.trim();
        if !text.is_empty() {
            return Some(BusLine::Command(text.to_string()));
        }
    }
    None
}

// ── spawn ─────────────────────────────────────────────────────────────────────

/// The three receive feeds.  Each ends when the adapter goes away.
pub struct RemoteFeeds {
    pub frames: mpsc::Receiver<String>,
    pub commands: mpsc::Receiver<String>,
    pub keys: mpsc::Receiver<u8>,
}

pub struct CecClient;

impl CecClient {
    /// Launch `cec-client` as configured and wire up its IO tasks.
    pub fn spawn(config: &RemoteConfig) -> anyhow::Result<(BusHandle, RemoteFeeds)> {
        let binary = plier_core::platform::find_executable(&config.client)
            .ok_or_else(|| anyhow::anyhow!("{} not found", config.client))?;

        let mut command = Command::new(&binary);
        command
            .arg("-t")
            .arg("p")
            .arg("-d")
            .arg(LOG_MASK.to_string());
        if !config.osd_name.is_empty() {
            command.arg("-o").arg(&config.osd_name);
        }
        if !config.port.is_empty() {
            command.arg(&config.port);
        }
        info!("remote: spawning {:?}", binary);
        start(command)
    }
}

/// Spawn `command` with piped stdio and start the reader, writer and reaper
/// tasks.  Must be called inside a tokio runtime.
pub fn start(mut command: Command) -> anyhow::Result<(BusHandle, RemoteFeeds)> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    info!("remote: adapter pid {:?}", child.id());

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow::anyhow!("remote adapter stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("remote adapter stdout unavailable"))?;

    let (req_tx, req_rx) = mpsc::channel::<BusRequest>(FEED_CAPACITY);
    let (frame_tx, frames) = mpsc::channel::<String>(FEED_CAPACITY);
    let (cmd_tx, commands) = mpsc::channel::<String>(FEED_CAPACITY);
    let (key_tx, keys) = mpsc::channel::<u8>(FEED_CAPACITY);

    tokio::spawn(writer_task(stdin, req_rx));
    tokio::spawn(reader_task(BufReader::new(stdout), frame_tx, cmd_tx, key_tx));
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!("remote: adapter exited ({})", status),
            Err(e) => warn!("remote: adapter wait failed: {}", e),
        }
    });

    Ok((
        BusHandle::new(req_tx),
        RemoteFeeds {
            frames,
            commands,
            keys,
        },
    ))
}

/// Wake the TV and, after the configured delay, show the banner on it.
/// Fire-and-forget: failures are only logged.
pub fn greet(bus: &BusHandle, config: &RemoteConfig) {
    if let Err(e) = bus.power_on(TV_ADDRESS) {
        warn!("remote: power on not sent: {}", e);
    }
    if config.banner.is_empty() {
        return;
    }
    let bus = bus.clone();
    let banner = config.banner.clone();
    let delay = std::time::Duration::from_secs(config.banner_delay_secs);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = bus.set_osd_string(TV_ADDRESS, &banner) {
            debug!("remote: banner not sent: {}", e);
        }
    });
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task(
    mut reader: BufReader<ChildStdout>,
    frame_tx: mpsc::Sender<String>,
    cmd_tx: mpsc::Sender<String>,
    key_tx: mpsc::Sender<u8>,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("remote reader: stdout closed");
                break;
            }
            Ok(_) => {
                let delivered = match classify_line(&line) {
                    Some(BusLine::Frame(f)) => frame_tx.send(f).await.is_ok(),
                    Some(BusLine::Command(c)) => cmd_tx.send(c).await.is_ok(),
                    Some(BusLine::KeyPress(k)) => key_tx.send(k).await.is_ok(),
                    None => true,
                };
                if !delivered {
                    debug!("remote reader: consumer gone");
                    break;
                }
            }
            Err(e) => {
                warn!("remote reader: read error: {}", e);
                break;
            }
        }
    }
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task(mut stdin: ChildStdin, mut rx: mpsc::Receiver<BusRequest>) {
    while let Some(request) = rx.recv().await {
        let mut line = request.to_line();
        debug!("remote writer: {}", line);
        line.push('\n');
        if let Err(e) = stdin.write_all(line.as_bytes()).await {
            warn!("remote writer: write failed: {}", e);
            break;
        }
        if let Err(e) = stdin.flush().await {
            warn!("remote writer: flush failed: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_traffic_line() {
        assert_eq!(
            classify_line("TRAFFIC: [         2891]\t>> 01:44:44\n"),
            Some(BusLine::Frame(">> 01:44:44".to_string()))
        );
        // Our own transmissions are not frames.
        assert_eq!(classify_line("TRAFFIC: [         2891]\t<< 10:8f"), None);
    }

    #[test]
    fn test_classify_key_press_line() {
        assert_eq!(
            classify_line("DEBUG:   [  4024]\tkey pressed: play (44) current(ff) duration(0)"),
            Some(BusLine::KeyPress(0x44))
        );
        assert_eq!(
            classify_line("DEBUG:   [  4024]\tkey pressed: up (1)"),
            Some(BusLine::KeyPress(0x01))
        );
        assert_eq!(classify_line("DEBUG: key pressed: (zz)"), None);
    }

    #[test]
    fn test_classify_notice_line() {
        assert_eq!(
            classify_line("NOTICE:  [   120]\tconnection opened"),
            Some(BusLine::Command("connection opened".to_string()))
        );
        assert_eq!(classify_line("NOTICE:  [   120]"), None);
        assert_eq!(classify_line("waiting for input"), None);
        assert_eq!(classify_line(""), None);
    }

    #[test]
    fn test_request_lines() {
        assert_eq!(BusRequest::PowerOn(0).to_line(), "on 0");
        assert_eq!(BusRequest::Poll(4).to_line(), "poll 4");
        assert_eq!(
            BusRequest::OsdString {
                address: 0,
                text: "This is Plier".to_string()
            }
            .to_line(),
            "osd 0 This is Plier"
        );
        assert_eq!(
            BusRequest::Transmit(Frame::new(0x4f, 0x9e, &[0x04])).to_line(),
            "tx 4f:9e:04"
        );
    }

    #[tokio::test]
    async fn test_handle_reports_closed_and_busy() {
        let (tx, rx) = mpsc::channel(1);
        let handle = BusHandle::new(tx);
        assert_eq!(handle.poll(0), Ok(()));
        assert_eq!(handle.poll(0), Err(BusError::Busy));
        drop(rx);
        assert_eq!(handle.power_on(0), Err(BusError::Closed));
    }

    #[tokio::test]
    async fn test_greet_powers_on_then_shows_banner() {
        let (tx, mut rx) = mpsc::channel(4);
        let bus = BusHandle::new(tx);
        let mut config = RemoteConfig::default();
        config.banner_delay_secs = 0;
        greet(&bus, &config);

        assert_eq!(rx.recv().await, Some(BusRequest::PowerOn(0)));
        assert_eq!(
            rx.recv().await,
            Some(BusRequest::OsdString {
                address: 0,
                text: config.banner.clone(),
            })
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_adapter_splits_feeds_and_closes() {
        let mut command = Command::new("sh");
        command.arg("-c").arg(
            "printf 'NOTICE:  [ 1]\\tconnection opened\\n\
             TRAFFIC: [ 2]\\t>> 01:44:44\\n\
             DEBUG:   [ 3]\\tkey pressed: play (44)\\n'",
        );
        let (_bus, mut feeds) = start(command).unwrap();

        assert_eq!(feeds.frames.recv().await.as_deref(), Some(">> 01:44:44"));
        assert_eq!(
            feeds.commands.recv().await.as_deref(),
            Some("connection opened")
        );
        assert_eq!(feeds.keys.recv().await, Some(0x44));

        // The script exits, so every feed ends.
        assert_eq!(feeds.frames.recv().await, None);
        assert_eq!(feeds.commands.recv().await, None);
        assert_eq!(feeds.keys.recv().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_requests_reach_adapter_stdin() {
        // `sed` turns each request line into a received frame.
        let mut command = Command::new("sed");
        command.arg("-u").arg("s/^poll \\(.*\\)$/>> 0\\1:8b:42/");
        let (bus, mut feeds) = start(command).unwrap();

        bus.poll(1).unwrap();
        assert_eq!(feeds.frames.recv().await.as_deref(), Some(">> 01:8b:42"));
    }
}
