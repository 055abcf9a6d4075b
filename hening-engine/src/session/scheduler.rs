//! Bell Interval Scheduler
//!
//! Decides whether the one-shot bell fires for a given timer transition. Each
//! offset fires at most once per session; `Offset::None` anywhere in the set
//! silences the bell entirely.

use super::timer::{SessionTimer, TimerEvent};
use crate::sound::SoundHandle;
use hening_common::Offset;
use std::collections::BTreeSet;
use tracing::debug;

/// Timer transitions the scheduler reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    EnteredRunning,
    Tick { elapsed: u64 },
    Completed,
}

impl Trigger {
    /// Map a timer event onto a trigger, if it is one
    pub fn from_event(event: &TimerEvent) -> Option<Self> {
        match *event {
            TimerEvent::EnteredRunning => Some(Trigger::EnteredRunning),
            TimerEvent::Tick { elapsed } => Some(Trigger::Tick { elapsed }),
            TimerEvent::Completed => Some(Trigger::Completed),
            _ => None,
        }
    }
}

/// Pure firing rule: which offset (if any) is due for this trigger
pub fn evaluate(
    offsets: &BTreeSet<Offset>,
    fired: &BTreeSet<Offset>,
    duration: u64,
    trigger: Trigger,
) -> Option<Offset> {
    if offsets.contains(&Offset::None) {
        return None;
    }

    let due = match trigger {
        Trigger::EnteredRunning => Offset::Start,
        Trigger::Tick { elapsed } if elapsed == duration / 2 => Offset::Middle,
        Trigger::Tick { .. } => return None,
        Trigger::Completed => Offset::End,
    };

    (offsets.contains(&due) && !fired.contains(&due)).then_some(due)
}

/// Applies [`evaluate`] to a live timer and rings the bell
#[derive(Debug, Clone)]
pub struct BellScheduler {
    bell: SoundHandle,
    offsets: BTreeSet<Offset>,
}

impl BellScheduler {
    pub fn new(bell: SoundHandle, offsets: BTreeSet<Offset>) -> Self {
        Self { bell, offsets }
    }

    pub fn offsets(&self) -> &BTreeSet<Offset> {
        &self.offsets
    }

    /// Record and fire the offset due for `event`, returning it.
    ///
    /// The offset is recorded before the bell is asked to play, and the play
    /// command does not wait for the audio.
    pub fn on_event(&self, timer: &mut SessionTimer, event: &TimerEvent) -> Option<Offset> {
        let trigger = Trigger::from_event(event)?;
        let offset = evaluate(
            &self.offsets,
            &timer.state().fired_offsets,
            timer.duration(),
            trigger,
        )?;

        if !timer.record_fired(offset) {
            return None;
        }
        debug!(
            "Bell {} at elapsed={} ({:?})",
            offset,
            timer.state().elapsed,
            self.bell.name()
        );
        self.bell.play_from_start();
        Some(offset)
    }
}
