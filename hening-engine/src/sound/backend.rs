//! Audio backend seam
//!
//! The pool loads assets through a [`SoundBackend`] and drives each loaded
//! asset through its [`Voice`]. The production backend decodes into the
//! mixer (`audio::MixerBackend`); tests substitute a recording backend.

use super::asset::SoundAsset;
use super::handle::PlayerState;
use crate::error::Result;
use std::time::Duration;

/// Loads catalog entries into playable voices.
///
/// `load` may block (file I/O, decoding); the pool calls it from a blocking
/// thread, one call per catalog entry, all entries concurrently.
pub trait SoundBackend: Send + Sync + 'static {
    fn load(&self, asset: &SoundAsset) -> Result<Box<dyn Voice>>;
}

/// One loaded sound's underlying player.
///
/// Calls are serialized by the owning handle's worker, so implementations
/// never see concurrent commands for the same voice.
pub trait Voice: Send + 'static {
    /// Start or continue playback from the current position
    fn play(&mut self, looping: bool) -> Result<()>;

    /// Halt playback, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Halt playback and return to Idle
    fn stop(&mut self) -> Result<()>;

    /// Move the playback position
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Current player state (one-shot voices return to Idle when they end)
    fn state(&self) -> PlayerState;

    /// Current playback position
    fn position(&self) -> Duration;

    /// Free the underlying resources; called exactly once
    fn release(&mut self);
}
