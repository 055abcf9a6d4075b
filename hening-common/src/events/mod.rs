//! Event types for the Hening session engine
//!
//! Events are broadcast by the session actor and can be serialized as JSON
//! for host views and the command-line runner.

mod session_types;

pub use session_types::{Offset, SessionPhase, SessionSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session event types
///
/// One enum for every event a host view can observe; use exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Session accepted its configuration and entered the lead-in
    Started {
        session_id: Uuid,
        duration_seconds: u64,
        lead_in_seconds: u64,
        offsets: Vec<Offset>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted once per tick while Preparing or Running
    Tick {
        session_id: Uuid,
        phase: SessionPhase,
        seconds_remaining: u64,
        pending_confirmation: bool,
        timestamp: DateTime<Utc>,
    },

    /// Ticking halted
    Paused {
        session_id: Uuid,
        /// Phase that resume will restore
        from: SessionPhase,
        seconds_remaining: u64,
        timestamp: DateTime<Utc>,
    },

    /// Ticking restarted from the paused snapshot
    Resumed {
        session_id: Uuid,
        to: SessionPhase,
        seconds_remaining: u64,
        timestamp: DateTime<Utc>,
    },

    /// Stop requested; host should ask the user to confirm
    ConfirmationRequested {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// User declined the stop; session continues
    ConfirmationDeclined {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Bell played for an offset
    BellFired {
        session_id: Uuid,
        offset: Offset,
        elapsed_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// Session ran to its full duration
    Completed {
        session_id: Uuid,
        duration_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// Session torn down before completion
    Cancelled {
        session_id: Uuid,
        elapsed_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// Session state reset to Idle; host should dismiss the session view
    Dismissed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::Started { session_id, .. }
            | SessionEvent::Tick { session_id, .. }
            | SessionEvent::Paused { session_id, .. }
            | SessionEvent::Resumed { session_id, .. }
            | SessionEvent::ConfirmationRequested { session_id, .. }
            | SessionEvent::ConfirmationDeclined { session_id, .. }
            | SessionEvent::BellFired { session_id, .. }
            | SessionEvent::Completed { session_id, .. }
            | SessionEvent::Cancelled { session_id, .. }
            | SessionEvent::Dismissed { session_id, .. } => *session_id,
        }
    }

    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "Started",
            SessionEvent::Tick { .. } => "Tick",
            SessionEvent::Paused { .. } => "Paused",
            SessionEvent::Resumed { .. } => "Resumed",
            SessionEvent::ConfirmationRequested { .. } => "ConfirmationRequested",
            SessionEvent::ConfirmationDeclined { .. } => "ConfirmationDeclined",
            SessionEvent::BellFired { .. } => "BellFired",
            SessionEvent::Completed { .. } => "Completed",
            SessionEvent::Cancelled { .. } => "Cancelled",
            SessionEvent::Dismissed { .. } => "Dismissed",
        }
    }

    /// Completed or Cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Completed { .. } | SessionEvent::Cancelled { .. })
    }
}
