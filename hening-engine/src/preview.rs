//! Short-lived preview playback for selection screens
//!
//! Tapping an option plays it from the start; tapping another stops and
//! rewinds the first. A preview stops by itself after a fixed duration. The
//! player shares pool handles but has no session state of its own.

use crate::sound::SoundHandle;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct PreviewState {
    current: Option<SoundHandle>,
    /// Bumped on every play/stop so a stale expiry timer does nothing
    generation: u64,
}

/// Plays one sound at a time, auto-expiring each preview
#[derive(Clone)]
pub struct PreviewPlayer {
    duration: Duration,
    state: Arc<Mutex<PreviewState>>,
}

impl std::fmt::Debug for PreviewPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewPlayer")
            .field("duration", &self.duration)
            .field("current", &self.current())
            .finish()
    }
}

impl PreviewPlayer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Arc::new(Mutex::new(PreviewState::default())),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Name of the sound being previewed
    pub fn current(&self) -> Option<String> {
        self.lock()
            .current
            .as_ref()
            .and_then(|handle| handle.name().map(str::to_string))
    }

    /// Stop any running preview and play `handle` from the start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play(&self, handle: &SoundHandle) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            if let Some(previous) = state.current.take() {
                rewind(&previous);
            }
            if handle.is_nil() {
                return;
            }
            handle.play_from_start();
            state.current = Some(handle.clone());
            state.generation
        };

        debug!("Previewing {:?} for {:?}", handle.name(), self.duration);
        let state = Arc::clone(&self.state);
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            if state.generation != generation {
                return;
            }
            if let Some(expired) = state.current.take() {
                debug!("Preview of {:?} expired", expired.name());
                rewind(&expired);
            }
        });
    }

    /// Stop and rewind the running preview, if any
    pub fn stop(&self) {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(previous) = state.current.take() {
            rewind(&previous);
        }
    }

    fn lock(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn rewind(handle: &SoundHandle) {
    handle.stop();
    handle.seek(Duration::ZERO);
}
