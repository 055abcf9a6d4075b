//! Meditation session engine
//!
//! - [`timer`]: the phase/countdown state machine
//! - [`scheduler`]: at-most-once bell decisions per offset
//! - [`ambiance`]: keeps the looping sound in step with the run state
//! - [`gate`]: confirm-before-cancel
//! - [`engine`]: the session actor tying them to a 1 Hz tick and the host

pub mod ambiance;
pub mod engine;
pub mod gate;
pub mod scheduler;
pub mod timer;

pub use ambiance::AmbianceController;
pub use engine::{SessionEngine, SessionHandle};
pub use gate::CancellationGate;
pub use scheduler::{BellScheduler, Trigger};
pub use timer::{SessionState, SessionTimer, TimerEvent, TransitionError};

use crate::sound::SoundHandle;
use hening_common::Offset;
use std::collections::BTreeSet;
use std::time::Duration;

/// Default preparation lead-in
pub const DEFAULT_LEAD_IN_SECONDS: u64 = 5;

/// Default tick period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Per-session configuration, fixed once the session starts
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub duration_seconds: u64,
    pub bell: SoundHandle,
    pub ambiance: SoundHandle,
    pub offsets: BTreeSet<Offset>,
}

impl SessionConfig {
    pub fn new(
        duration_seconds: u64,
        bell: SoundHandle,
        ambiance: SoundHandle,
        offsets: impl IntoIterator<Item = Offset>,
    ) -> Self {
        Self {
            duration_seconds,
            bell,
            ambiance,
            offsets: offsets.into_iter().collect(),
        }
    }

    /// `None` among the offsets silences every bell
    pub fn bells_silenced(&self) -> bool {
        self.offsets.contains(&Offset::None)
    }
}

/// Engine-wide session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub lead_in_seconds: u64,
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lead_in_seconds: DEFAULT_LEAD_IN_SECONDS,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
