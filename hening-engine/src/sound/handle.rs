//! Pool-owned sound handles
//!
//! A [`SoundHandle`] is a cheap, clonable reference to one loaded asset. Every
//! non-nil handle owns a command queue drained by a single worker task, so
//! commands on the same handle complete strictly in issue order while the
//! caller never waits on them. A nil handle (silent entry or failed load)
//! accepts every command and does nothing.

use super::asset::{SoundAsset, SoundCategory};
use super::backend::Voice;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Player state reported by a handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
        }
    }
}

/// State and position observed after all earlier commands were applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub state: PlayerState,
    pub position: Duration,
}

enum Command {
    Play { looping: bool },
    PlayFromStart,
    Pause,
    Stop,
    Seek(Duration),
    Status(oneshot::Sender<PlaybackStatus>),
    Settle(oneshot::Sender<()>),
    Release(oneshot::Sender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Play { .. } => "play",
            Command::PlayFromStart => "play_from_start",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Seek(_) => "seek",
            Command::Status(_) => "status",
            Command::Settle(_) => "settle",
            Command::Release(_) => "release",
        }
    }
}

struct HandleInner {
    name: String,
    category: SoundCategory,
    looping: bool,
    tx: mpsc::UnboundedSender<Command>,
    released: AtomicBool,
    play_requests: AtomicU64,
}

/// Reusable reference to one pool-owned sound
#[derive(Clone, Default)]
pub struct SoundHandle {
    inner: Option<Arc<HandleInner>>,
}

impl std::fmt::Debug for SoundHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(inner) => f
                .debug_struct("SoundHandle")
                .field("name", &inner.name)
                .field("category", &inner.category)
                .field("released", &inner.released.load(Ordering::Relaxed))
                .finish(),
            None => write!(f, "SoundHandle(nil)"),
        }
    }
}

impl SoundHandle {
    /// The nil handle: every operation is a no-op
    pub fn nil() -> Self {
        Self { inner: None }
    }

    /// Bind a loaded voice to a new handle and start its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(asset: &SoundAsset, voice: Box<dyn Voice>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(asset.name.clone(), asset.looping, voice, rx));

        Self {
            inner: Some(Arc::new(HandleInner {
                name: asset.name.clone(),
                category: asset.category,
                looping: asset.looping,
                tx,
                released: AtomicBool::new(false),
                play_requests: AtomicU64::new(0),
            })),
        }
    }

    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    /// Catalog name, `None` for the nil handle
    pub fn name(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.name.as_str())
    }

    /// Number of play / play_from_start commands issued on this handle
    pub fn play_requests(&self) -> u64 {
        self.inner
            .as_ref()
            .map(|inner| inner.play_requests.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Start playback using the asset's own looping flag
    pub fn play(&self) {
        if let Some(inner) = &self.inner {
            inner.play_requests.fetch_add(1, Ordering::Relaxed);
            self.send(Command::Play { looping: inner.looping });
        }
    }

    /// Start playback with looping enabled
    pub fn play_looping(&self) {
        if let Some(inner) = &self.inner {
            inner.play_requests.fetch_add(1, Ordering::Relaxed);
            self.send(Command::Play { looping: true });
        }
    }

    /// Stop, rewind and play; never overlaps a still-sounding previous play
    pub fn play_from_start(&self) {
        if let Some(inner) = &self.inner {
            inner.play_requests.fetch_add(1, Ordering::Relaxed);
            self.send(Command::PlayFromStart);
        }
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn seek(&self, position: Duration) {
        self.send(Command::Seek(position));
    }

    /// State after every previously issued command has completed
    pub async fn query_state(&self) -> PlayerState {
        self.status().await.state
    }

    /// State and position after every previously issued command has completed
    pub async fn status(&self) -> PlaybackStatus {
        let (reply_tx, reply_rx) = oneshot::channel();
        if !self.send(Command::Status(reply_tx)) {
            return PlaybackStatus::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Wait until every previously issued command has completed
    pub async fn settle(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.send(Command::Settle(reply_tx)) {
            let _ = reply_rx.await;
        }
    }

    /// Release the underlying voice; only the first call has any effect
    pub(crate) async fn release(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        if inner.released.swap(true, Ordering::SeqCst) {
            debug!("Sound '{}' already released", inner.name);
            return;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        if inner.tx.send(Command::Release(reply_tx)).is_ok() {
            let _ = reply_rx.await;
        }
    }

    /// Queue a command. Returns false when nothing will answer it.
    fn send(&self, command: Command) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };

        if inner.released.load(Ordering::SeqCst) {
            warn!("Ignoring {} on released sound '{}'", command.name(), inner.name);
            return false;
        }

        let name = command.name();
        if inner.tx.send(command).is_err() {
            warn!("Sound worker for '{}' is gone, dropping {}", inner.name, name);
            return false;
        }
        true
    }
}

/// Worker loop: applies commands to the voice one at a time
async fn run_worker(
    name: String,
    looping: bool,
    mut voice: Box<dyn Voice>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("Sound worker '{}' started", name);

    while let Some(command) = rx.recv().await {
        match command {
            Command::Status(reply) => {
                let _ = reply.send(PlaybackStatus {
                    state: voice.state(),
                    position: voice.position(),
                });
            }
            Command::Settle(reply) => {
                let _ = reply.send(());
            }
            Command::Release(reply) => {
                voice.release();
                let _ = reply.send(());
                debug!("Sound worker '{}' released", name);
                return;
            }
            command => {
                let label = command.name();
                if let Err(e) = apply(voice.as_mut(), command, looping) {
                    // Playback failures degrade to silence
                    warn!("Sound '{}': {} failed: {}", name, label, e);
                }
            }
        }
    }

    // Every handle clone dropped without dispose()
    voice.release();
    debug!("Sound worker '{}' stopped", name);
}

/// Apply one playback command, skipping commands already satisfied
fn apply(voice: &mut dyn Voice, command: Command, asset_looping: bool) -> crate::Result<()> {
    match command {
        Command::Play { looping } => {
            if voice.state() == PlayerState::Playing {
                return Ok(());
            }
            voice.play(looping)
        }
        Command::PlayFromStart => {
            if voice.state() != PlayerState::Idle {
                voice.stop()?;
            }
            voice.seek(Duration::ZERO)?;
            voice.play(asset_looping)
        }
        Command::Pause => {
            if voice.state() != PlayerState::Playing {
                return Ok(());
            }
            voice.pause()
        }
        Command::Stop => {
            if voice.state() == PlayerState::Idle {
                return Ok(());
            }
            voice.stop()
        }
        Command::Seek(position) => voice.seek(position),
        Command::Status(_) | Command::Settle(_) | Command::Release(_) => Ok(()),
    }
}
