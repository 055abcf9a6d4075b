//! Cancellation Gate: a stop request only takes effect once confirmed

use tracing::debug;

/// Pending stop confirmation.
///
/// Remembers whether declining should resume the session, which is only the
/// case when the stop request itself did the pausing.
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    pending: Option<bool>,
}

impl CancellationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the gate. Returns false if a confirmation is already pending.
    pub fn raise(&mut self, resume_on_decline: bool) -> bool {
        if self.pending.is_some() {
            debug!("Stop already awaiting confirmation");
            return false;
        }
        self.pending = Some(resume_on_decline);
        true
    }

    /// Lower the gate, returning whether declining should resume
    pub fn take(&mut self) -> Option<bool> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
