//! # Hening Meditation Session Engine (hening-engine)
//!
//! Drives a timed meditation session: a lead-in countdown, a running countdown
//! with bells at configurable offsets, a looping ambiance sound that follows the
//! session's run state, pause/resume, and a confirm-before-cancel stop flow.
//!
//! **Architecture:** sounds are decoded once into a [`sound::SoundPool`]
//! (symphonia + rubato, mixed by [`audio::Mixer`] and sent to a cpal or null output).
//! A session actor owns the [`session::SessionTimer`] and issues fire-and-forget
//! commands to pool-owned [`sound::SoundHandle`]s, each serialized by its own worker.

pub mod audio;
pub mod config;
pub mod error;
pub mod picker;
pub mod preview;
pub mod session;
pub mod sound;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use hening_common::{Offset, SessionEvent, SessionPhase, SessionSnapshot};
pub use session::{SessionConfig, SessionEngine, SessionHandle, SessionSettings};
pub use sound::{PlayerState, SoundAsset, SoundCategory, SoundHandle, SoundPool};
