//! Ambiance Playback Controller
//!
//! Mirrors the session's run state onto the looping ambiance handle. Every
//! method is safe to call in any handle state, and a nil handle makes all of
//! them no-ops.

use crate::sound::{PlayerState, SoundHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AmbianceController {
    handle: SoundHandle,
}

impl AmbianceController {
    pub fn new(handle: SoundHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &SoundHandle {
        &self.handle
    }

    /// Entered Running, from Preparing or via resume
    pub async fn on_running(&self) {
        if self.handle.is_nil() {
            return;
        }
        if self.handle.query_state().await != PlayerState::Playing {
            debug!("Ambiance {:?} playing", self.handle.name());
            self.handle.play_looping();
        }
    }

    /// Entered Paused; position is retained
    pub async fn on_paused(&self) {
        if self.handle.is_nil() {
            return;
        }
        if self.handle.query_state().await == PlayerState::Playing {
            debug!("Ambiance {:?} paused", self.handle.name());
            self.handle.pause();
        }
    }

    /// Entered Completed or Cancelled: stop and rewind, then wait for both to land
    pub async fn on_finished(&self) {
        if self.handle.is_nil() {
            return;
        }
        self.handle.stop();
        self.handle.seek(Duration::ZERO);
        self.handle.settle().await;
        debug!("Ambiance {:?} stopped and rewound", self.handle.name());
    }
}
