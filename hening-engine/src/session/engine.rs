//! Session actor and its public handle
//!
//! [`SessionEngine::start`] resolves sound names through the pool and spawns
//! one actor task per session. The actor owns the [`SessionTimer`], the bell
//! scheduler, the ambiance controller and the cancellation gate, and is the
//! only place session state changes. Host views talk to it through a
//! [`SessionHandle`]: control calls are queued and answered with the snapshot
//! taken after they were applied, state is published on a `watch` channel and
//! every transition is broadcast as a [`SessionEvent`].

use super::ambiance::AmbianceController;
use super::gate::CancellationGate;
use super::scheduler::BellScheduler;
use super::timer::{SessionTimer, TimerEvent};
use super::{SessionConfig, SessionSettings};
use crate::error::{Error, Result};
use crate::sound::{SoundCategory, SoundHandle, SoundPool};
use chrono::Utc;
use hening_common::{Offset, SessionEvent, SessionPhase, SessionSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;
const CONTROL_CAPACITY: usize = 32;

/// Start API: builds sessions against a ready sound pool
pub struct SessionEngine {
    pool: Arc<SoundPool>,
    settings: SessionSettings,
    active: Arc<AtomicBool>,
}

impl SessionEngine {
    pub fn new(pool: Arc<SoundPool>, settings: SessionSettings) -> Self {
        Self {
            pool,
            settings,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn pool(&self) -> &Arc<SoundPool> {
        &self.pool
    }

    /// A session is preparing, running or paused
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a session and enter the lead-in.
    ///
    /// Unknown or silent sound names resolve to nil handles. Fails if the
    /// duration is zero or another session is still active. Must be called
    /// from within a tokio runtime.
    pub fn start(
        &self,
        duration_seconds: u64,
        bell_name: &str,
        ambiance_name: &str,
        offsets: impl IntoIterator<Item = Offset>,
    ) -> Result<SessionHandle> {
        if !self.pool.is_ready() {
            warn!("Sound pool not ready, session sounds will be silent");
        }
        let config = SessionConfig::new(
            duration_seconds,
            self.resolve(SoundCategory::Bell, bell_name),
            self.resolve(SoundCategory::Ambiance, ambiance_name),
            offsets,
        );
        self.start_with(config)
    }

    /// Start a session from already resolved handles
    pub fn start_with(&self, config: SessionConfig) -> Result<SessionHandle> {
        let mut timer = SessionTimer::new(self.settings.lead_in_seconds);
        let initial = timer.start(config.duration_seconds)?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Session start ignored: another session is active");
            return Err(Error::InvalidState(
                "another session is already active".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (event_tx, first_rx) = broadcast::channel(EVENT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(timer.snapshot(false));
        let (outcome_tx, outcome_rx) = watch::channel(None);

        info!(
            session_id = %id,
            duration = config.duration_seconds,
            lead_in = self.settings.lead_in_seconds,
            offsets = ?config.offsets,
            "Starting session (bell={:?}, ambiance={:?})",
            config.bell.name(),
            config.ambiance.name()
        );

        let actor = SessionActor {
            id,
            timer,
            scheduler: BellScheduler::new(config.bell.clone(), config.offsets.clone()),
            ambiance: AmbianceController::new(config.ambiance.clone()),
            gate: CancellationGate::new(),
            config,
            settings: self.settings,
            events: event_tx.clone(),
            state: state_tx,
            outcome: outcome_tx,
            active: Arc::clone(&self.active),
            holds_slot: true,
        };
        tokio::spawn(actor.run(control_rx, initial));

        Ok(SessionHandle {
            id,
            control: control_tx,
            events: event_tx,
            first_subscriber: Arc::new(Mutex::new(Some(first_rx))),
            state: state_rx,
            outcome: outcome_rx,
        })
    }

    fn resolve(&self, category: SoundCategory, name: &str) -> SoundHandle {
        if self.pool.is_ready() && !self.pool.contains(category, name) {
            warn!("Unknown {} '{}', using no sound", category, name);
        }
        self.pool.get_in(category, name)
    }
}

enum Control {
    Pause(oneshot::Sender<SessionSnapshot>),
    Resume(oneshot::Sender<SessionSnapshot>),
    RequestStop(oneshot::Sender<SessionSnapshot>),
    ConfirmStop(bool, oneshot::Sender<SessionSnapshot>),
    Acknowledge(oneshot::Sender<SessionSnapshot>),
}

/// Host-side handle to one running session.
///
/// Clones share the session. Dropping the last clone while the session is
/// still active cancels it, releasing the ambiance exactly as a confirmed stop
/// would.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    control: mpsc::Sender<Control>,
    events: broadcast::Sender<SessionEvent>,
    // Created with the channel so the first subscriber also sees Started
    first_subscriber: Arc<Mutex<Option<broadcast::Receiver<SessionEvent>>>>,
    state: watch::Receiver<SessionSnapshot>,
    outcome: watch::Receiver<Option<SessionPhase>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Halt ticking; no-op unless Preparing or Running
    pub async fn pause(&self) -> SessionSnapshot {
        self.send(Control::Pause).await
    }

    /// Continue from the paused snapshot; no-op unless Paused
    pub async fn resume(&self) -> SessionSnapshot {
        self.send(Control::Resume).await
    }

    /// Pause and ask for confirmation before cancelling
    pub async fn request_stop(&self) -> SessionSnapshot {
        self.send(Control::RequestStop).await
    }

    /// Answer a pending stop request.
    ///
    /// `true` returns once the ambiance has stopped and rewound and the timer
    /// is back to Idle. `false` continues the session where it paused.
    pub async fn confirm_stop(&self, confirm: bool) -> SessionSnapshot {
        self.send(|reply| Control::ConfirmStop(confirm, reply)).await
    }

    /// Dismiss a completed session, resetting it to Idle
    pub async fn acknowledge(&self) -> SessionSnapshot {
        self.send(Control::Acknowledge).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Session events from now on (the first subscriber gets every event)
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        let first = self
            .first_subscriber
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        first.unwrap_or_else(|| self.events.subscribe())
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Snapshots as a stream, starting with the current one
    pub fn state_stream(&self) -> WatchStream<SessionSnapshot> {
        WatchStream::new(self.state.clone())
    }

    /// Wait for the session to end, returning Completed or Cancelled
    pub async fn finished(&self) -> SessionPhase {
        let mut outcome = self.outcome.clone();
        let result = outcome.wait_for(Option::is_some).await.map(|phase| *phase);
        match result {
            Ok(Some(phase)) => phase,
            _ => SessionPhase::Cancelled,
        }
    }

    async fn send(
        &self,
        make: impl FnOnce(oneshot::Sender<SessionSnapshot>) -> Control,
    ) -> SessionSnapshot {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.control.send(make(reply_tx)).await.is_err() {
            debug!("Session {} has ended, ignoring control", self.id);
            return self.snapshot();
        }
        match reply_rx.await {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

/// Whether the actor keeps running after a control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct SessionActor {
    id: Uuid,
    timer: SessionTimer,
    scheduler: BellScheduler,
    ambiance: AmbianceController,
    gate: CancellationGate,
    config: SessionConfig,
    settings: SessionSettings,
    events: broadcast::Sender<SessionEvent>,
    state: watch::Sender<SessionSnapshot>,
    outcome: watch::Sender<Option<SessionPhase>>,
    active: Arc<AtomicBool>,
    holds_slot: bool,
}

impl SessionActor {
    async fn run(mut self, mut control: mpsc::Receiver<Control>, initial: Vec<TimerEvent>) {
        self.emit(SessionEvent::Started {
            session_id: self.id,
            duration_seconds: self.config.duration_seconds,
            lead_in_seconds: self.timer.lead_in(),
            offsets: self.config.offsets.iter().copied().collect(),
            timestamp: Utc::now(),
        });
        self.apply_timer_events(initial).await;

        let period = self.settings.tick_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                message = control.recv() => {
                    let Some(message) = message else {
                        self.teardown_on_drop().await;
                        break;
                    };
                    if self.handle_control(message, &mut ticker).await == Flow::Exit {
                        break;
                    }
                }

                _ = ticker.tick(), if self.timer.is_ticking() => {
                    let events = self.timer.tick();
                    self.apply_timer_events(events).await;
                }
            }
        }

        self.release_slot();
        debug!("Session {} actor stopped", self.id);
    }

    async fn handle_control(&mut self, message: Control, ticker: &mut Interval) -> Flow {
        match message {
            Control::Pause(reply) => {
                self.pause().await;
                self.reply(reply);
            }
            Control::Resume(reply) => {
                if self.gate.is_pending() {
                    warn!("Resume ignored while a stop awaits confirmation");
                } else {
                    self.resume(ticker).await;
                }
                self.reply(reply);
            }
            Control::RequestStop(reply) => {
                self.request_stop().await;
                self.reply(reply);
            }
            Control::ConfirmStop(confirm, reply) => {
                let Some(resume_on_decline) = self.gate.take() else {
                    warn!("No stop awaiting confirmation");
                    self.reply(reply);
                    return Flow::Continue;
                };

                if confirm {
                    self.cancel().await;
                    self.reply(reply);
                    return Flow::Exit;
                }

                info!(session_id = %self.id, "Stop declined");
                self.emit(SessionEvent::ConfirmationDeclined {
                    session_id: self.id,
                    timestamp: Utc::now(),
                });
                if resume_on_decline {
                    self.resume(ticker).await;
                } else {
                    self.publish();
                }
                self.reply(reply);
            }
            Control::Acknowledge(reply) => {
                if self.timer.phase() == SessionPhase::Completed {
                    self.dismiss();
                    self.reply(reply);
                    return Flow::Exit;
                }
                debug!("Acknowledge ignored while {}", self.timer.phase());
                self.reply(reply);
            }
        }
        Flow::Continue
    }

    async fn pause(&mut self) {
        match self.timer.pause() {
            Ok(TimerEvent::Paused { from }) => {
                self.ambiance.on_paused().await;
                info!(session_id = %self.id, "Session paused ({})", from);
                self.emit(SessionEvent::Paused {
                    session_id: self.id,
                    from,
                    seconds_remaining: self.timer.seconds_remaining(),
                    timestamp: Utc::now(),
                });
                self.publish();
            }
            Ok(_) => {}
            Err(e) => warn!("Pause ignored: {}", e),
        }
    }

    async fn resume(&mut self, ticker: &mut Interval) {
        match self.timer.resume() {
            Ok(TimerEvent::Resumed { to }) => {
                // A full period until the next tick
                ticker.reset();
                if to == SessionPhase::Running {
                    self.ambiance.on_running().await;
                }
                info!(session_id = %self.id, "Session resumed ({})", to);
                self.emit(SessionEvent::Resumed {
                    session_id: self.id,
                    to,
                    seconds_remaining: self.timer.seconds_remaining(),
                    timestamp: Utc::now(),
                });
                self.publish();
            }
            Ok(_) => {}
            Err(e) => warn!("Resume ignored: {}", e),
        }
    }

    async fn request_stop(&mut self) {
        if self.gate.is_pending() {
            debug!("Stop already requested");
            return;
        }

        let resume_on_decline = match self.timer.phase() {
            phase if phase.is_ticking() => {
                self.pause().await;
                true
            }
            SessionPhase::Paused => false,
            phase => {
                warn!("Stop request ignored while {}", phase);
                return;
            }
        };

        self.gate.raise(resume_on_decline);
        info!(session_id = %self.id, "Stop requested, awaiting confirmation");
        self.emit(SessionEvent::ConfirmationRequested {
            session_id: self.id,
            timestamp: Utc::now(),
        });
        self.publish();
    }

    /// Confirmed stop: release the ambiance, cancel, then reset to Idle
    async fn cancel(&mut self) {
        self.ambiance.on_finished().await;

        if let Err(e) = self.timer.cancel() {
            warn!("Cancel ignored: {}", e);
            return;
        }
        let elapsed = self.timer.state().elapsed;
        info!(session_id = %self.id, elapsed, "Session cancelled");
        self.emit(SessionEvent::Cancelled {
            session_id: self.id,
            elapsed_seconds: elapsed,
            timestamp: Utc::now(),
        });
        self.publish();
        self.outcome.send_replace(Some(SessionPhase::Cancelled));

        self.dismiss();
    }

    /// Every handle dropped: cancel an active session, dismiss a completed one
    async fn teardown_on_drop(&mut self) {
        let phase = self.timer.phase();
        if phase.is_active() {
            info!(session_id = %self.id, "Session handle dropped while {}, tearing down", phase);
            self.gate.take();
            self.cancel().await;
        } else if phase == SessionPhase::Completed {
            self.dismiss();
        }
    }

    fn dismiss(&mut self) {
        self.timer.reset();
        self.gate.take();
        self.release_slot();
        self.emit(SessionEvent::Dismissed {
            session_id: self.id,
            timestamp: Utc::now(),
        });
        self.publish();
    }

    async fn apply_timer_events(&mut self, events: Vec<TimerEvent>) {
        for event in &events {
            if let Some(offset) = self.scheduler.on_event(&mut self.timer, event) {
                self.emit(SessionEvent::BellFired {
                    session_id: self.id,
                    offset,
                    elapsed_seconds: self.timer.state().elapsed,
                    timestamp: Utc::now(),
                });
            }

            match event {
                TimerEvent::EnteredRunning => {
                    info!(session_id = %self.id, "Preparation finished, session running");
                    self.ambiance.on_running().await;
                }
                TimerEvent::Completed => {
                    self.ambiance.on_finished().await;
                    info!(session_id = %self.id, "Session completed");
                    self.emit(SessionEvent::Completed {
                        session_id: self.id,
                        duration_seconds: self.timer.duration(),
                        timestamp: Utc::now(),
                    });
                    self.outcome.send_replace(Some(SessionPhase::Completed));
                    // A new session may start while the completed one awaits dismissal
                    self.release_slot();
                }
                TimerEvent::LeadTick { lead_remaining } => {
                    debug!("Lead-in remaining {}", lead_remaining)
                }
                TimerEvent::Tick { elapsed } => debug!("Elapsed {}", elapsed),
                _ => {}
            }
        }

        if self.timer.is_ticking() {
            self.emit(SessionEvent::Tick {
                session_id: self.id,
                phase: self.timer.phase(),
                seconds_remaining: self.timer.seconds_remaining(),
                pending_confirmation: self.gate.is_pending(),
                timestamp: Utc::now(),
            });
        }
        self.publish();
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.state
            .send_replace(self.timer.snapshot(self.gate.is_pending()));
    }

    fn reply(&self, reply: oneshot::Sender<SessionSnapshot>) {
        let _ = reply.send(self.timer.snapshot(self.gate.is_pending()));
    }

    /// Give up the engine's single session slot, once
    fn release_slot(&mut self) {
        if std::mem::take(&mut self.holds_slot) {
            self.active.store(false, Ordering::SeqCst);
        }
    }
}
