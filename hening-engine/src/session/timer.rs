//! Session Timer state machine
//!
//! `Idle -> Preparing(lead) -> Running(elapsed) -> Completed`, with `Paused`
//! reachable from Preparing or Running and `Cancelled` from any active phase.
//! The timer is pure: it never sleeps, it only advances when [`SessionTimer::tick`]
//! is called, and reports what happened as [`TimerEvent`]s.

use hening_common::{Offset, SessionPhase, SessionSnapshot};
use std::collections::BTreeSet;
use thiserror::Error;

/// Mutable state of one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub lead_remaining: u64,
    pub elapsed: u64,
    /// Only grows during a session; cleared by reset
    pub fired_offsets: BTreeSet<Offset>,
    pub paused_from: Option<SessionPhase>,
}

/// What a timer call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    EnteredPreparing { lead: u64 },
    LeadTick { lead_remaining: u64 },
    EnteredRunning,
    /// Running second boundary; also emitted with `elapsed: 0` on entering Running
    Tick { elapsed: u64 },
    Completed,
    Paused { from: SessionPhase },
    Resumed { to: SessionPhase },
    Cancelled,
    Reset,
}

/// Rejected transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error("session duration must be greater than zero")]
    ZeroDuration,
}

/// Drives lead-in, countdown, pause and termination
#[derive(Debug, Clone)]
pub struct SessionTimer {
    state: SessionState,
    lead_in: u64,
    duration: u64,
}

impl SessionTimer {
    pub fn new(lead_in: u64) -> Self {
        Self {
            state: SessionState::default(),
            lead_in,
            duration: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn lead_in(&self) -> u64 {
        self.lead_in
    }

    /// Elapsed second at which the Middle bell is due
    pub fn midpoint(&self) -> u64 {
        self.duration / 2
    }

    pub fn is_ticking(&self) -> bool {
        self.state.phase.is_ticking()
    }

    /// Seconds left in whichever countdown is current (paused ones included)
    pub fn seconds_remaining(&self) -> u64 {
        let counting = match self.state.phase {
            SessionPhase::Paused => self.state.paused_from.unwrap_or(SessionPhase::Running),
            phase => phase,
        };
        match counting {
            SessionPhase::Preparing => self.state.lead_remaining,
            SessionPhase::Running => self.duration.saturating_sub(self.state.elapsed),
            _ => 0,
        }
    }

    /// `Idle -> Preparing(lead)`; straight to Running when the lead-in is zero
    pub fn start(&mut self, duration: u64) -> Result<Vec<TimerEvent>, TransitionError> {
        self.require(SessionPhase::Idle, "start")?;
        if duration == 0 {
            return Err(TransitionError::ZeroDuration);
        }

        self.duration = duration;
        self.state = SessionState {
            phase: SessionPhase::Preparing,
            lead_remaining: self.lead_in,
            ..SessionState::default()
        };

        let mut events = vec![TimerEvent::EnteredPreparing { lead: self.lead_in }];
        if self.lead_in == 0 {
            self.enter_running(&mut events);
        }
        Ok(events)
    }

    /// Advance one second. Does nothing unless Preparing or Running.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        match self.state.phase {
            SessionPhase::Preparing => {
                self.state.lead_remaining = self.state.lead_remaining.saturating_sub(1);
                events.push(TimerEvent::LeadTick {
                    lead_remaining: self.state.lead_remaining,
                });
                if self.state.lead_remaining == 0 {
                    self.enter_running(&mut events);
                }
            }
            SessionPhase::Running => {
                self.state.elapsed += 1;
                events.push(TimerEvent::Tick {
                    elapsed: self.state.elapsed,
                });
                if self.state.elapsed >= self.duration {
                    self.state.phase = SessionPhase::Completed;
                    events.push(TimerEvent::Completed);
                }
            }
            _ => {}
        }
        events
    }

    /// Snapshot Preparing/Running into Paused
    pub fn pause(&mut self) -> Result<TimerEvent, TransitionError> {
        let from = self.state.phase;
        if !from.is_ticking() {
            return Err(TransitionError::InvalidPhase {
                action: "pause",
                phase: from,
            });
        }
        self.state.paused_from = Some(from);
        self.state.phase = SessionPhase::Paused;
        Ok(TimerEvent::Paused { from })
    }

    /// Restore the phase snapshotted by pause
    pub fn resume(&mut self) -> Result<TimerEvent, TransitionError> {
        self.require(SessionPhase::Paused, "resume")?;
        let to = self.state.paused_from.take().unwrap_or(SessionPhase::Running);
        self.state.phase = to;
        Ok(TimerEvent::Resumed { to })
    }

    /// Any active phase to Cancelled
    pub fn cancel(&mut self) -> Result<TimerEvent, TransitionError> {
        if !self.state.phase.is_active() {
            return Err(TransitionError::InvalidPhase {
                action: "cancel",
                phase: self.state.phase,
            });
        }
        self.state.phase = SessionPhase::Cancelled;
        self.state.paused_from = None;
        Ok(TimerEvent::Cancelled)
    }

    /// Back to Idle from anywhere, discarding counters and fired offsets
    pub fn reset(&mut self) -> TimerEvent {
        self.state = SessionState::default();
        self.duration = 0;
        TimerEvent::Reset
    }

    /// Record a fired offset. Returns false if it had already fired.
    pub fn record_fired(&mut self, offset: Offset) -> bool {
        self.state.fired_offsets.insert(offset)
    }

    /// Observable snapshot of the current state
    pub fn snapshot(&self, pending_confirmation: bool) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.state.phase,
            paused_from: self.state.paused_from,
            lead_remaining: self.state.lead_remaining,
            elapsed_seconds: self.state.elapsed,
            seconds_remaining: self.seconds_remaining(),
            pending_confirmation,
            fired_offsets: self.state.fired_offsets.iter().copied().collect(),
        }
    }

    fn enter_running(&mut self, events: &mut Vec<TimerEvent>) {
        self.state.phase = SessionPhase::Running;
        self.state.elapsed = 0;
        events.push(TimerEvent::EnteredRunning);
        events.push(TimerEvent::Tick { elapsed: 0 });
    }

    fn require(&self, phase: SessionPhase, action: &'static str) -> Result<(), TransitionError> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(TransitionError::InvalidPhase {
                action,
                phase: self.state.phase,
            })
        }
    }
}
