//! Session-related type definitions
//!
//! Supporting types for session phases, bell offsets and the observable snapshot.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Session phase enumeration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session in progress
    #[default]
    Idle,
    /// Lead-in countdown before the timed session
    Preparing,
    /// Timed session counting down
    Running,
    /// Ticking halted, counters retained
    Paused,
    /// Session reached its full duration
    Completed,
    /// Session torn down before completion
    Cancelled,
}

impl SessionPhase {
    /// Completed or Cancelled
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Cancelled)
    }

    /// Phases in which the 1 Hz tick advances a counter
    pub fn is_ticking(self) -> bool {
        matches!(self, SessionPhase::Preparing | SessionPhase::Running)
    }

    /// Preparing, Running or Paused
    pub fn is_active(self) -> bool {
        self.is_ticking() || self == SessionPhase::Paused
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Preparing => write!(f, "preparing"),
            SessionPhase::Running => write!(f, "running"),
            SessionPhase::Paused => write!(f, "paused"),
            SessionPhase::Completed => write!(f, "completed"),
            SessionPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Named trigger point at which the bell fires at most once per session.
///
/// `None` silences the bell for the whole session regardless of any other
/// offsets selected alongside it.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Offset {
    None,
    Start,
    Middle,
    End,
}

impl Offset {
    /// Offsets offered by the interval picker, in display order
    pub const ALL: [Offset; 4] = [Offset::Start, Offset::Middle, Offset::End, Offset::None];
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Offset::None => write!(f, "none"),
            Offset::Start => write!(f, "start"),
            Offset::Middle => write!(f, "middle"),
            Offset::End => write!(f, "end"),
        }
    }
}

impl FromStr for Offset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no sound" => Ok(Offset::None),
            "start" | "beginning" => Ok(Offset::Start),
            "middle" => Ok(Offset::Middle),
            "end" => Ok(Offset::End),
            other => Err(Error::InvalidInput(format!("unknown bell offset '{}'", other))),
        }
    }
}

/// Latest observable state of a session, published to the host view
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current phase
    pub phase: SessionPhase,
    /// Phase restored by resume (only while Paused)
    pub paused_from: Option<SessionPhase>,
    /// Seconds of lead-in left
    pub lead_remaining: u64,
    /// Seconds of the timed session already elapsed
    pub elapsed_seconds: u64,
    /// Seconds left in the current countdown (lead-in or session)
    pub seconds_remaining: u64,
    /// Cancellation gate is waiting for confirm/decline
    pub pending_confirmation: bool,
    /// Offsets whose bell has already fired this session
    pub fired_offsets: Vec<Offset>,
}
