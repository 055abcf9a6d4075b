//! Test helper modules for hening-engine integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingBackend: in-memory sound backend that records every voice command
//! - ready_pool / start_engine: pool and engine setup over the built-in catalog
//! - advance: move the paused test clock

#![allow(dead_code)]

use hening_engine::sound::{default_catalog, SoundBackend, Voice};
use hening_engine::{
    Error, PlayerState, Result, SessionEngine, SessionSettings, SoundAsset, SoundPool,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// One command that reached a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceOp {
    Play { looping: bool },
    Pause,
    Stop,
    Seek(Duration),
    Release,
}

/// Everything that happened to one loaded voice
#[derive(Debug, Default)]
pub struct VoiceRecord {
    pub state: PlayerState,
    pub position: Duration,
    pub ops: Vec<VoiceOp>,
    pub releases: usize,
}

/// Sound backend that never touches audio.
///
/// Voices start Idle, `play` makes them Playing until paused or stopped
/// (one-shots never end on their own), and every command is logged.
#[derive(Default)]
pub struct RecordingBackend {
    voices: Mutex<HashMap<String, Arc<Mutex<VoiceRecord>>>>,
    fail_loads: HashSet<String>,
    fail_commands: HashSet<String>,
    stall_loads: HashSet<String>,
    stall_gate: Arc<(Mutex<bool>, Condvar)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loading any of these names fails
    pub fn failing_loads(mut self, names: &[&str]) -> Self {
        self.fail_loads.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Loading any of these names blocks until `release_stalled` is called,
    /// then succeeds
    pub fn stalling_loads(mut self, names: &[&str]) -> Self {
        self.stall_loads.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Let stalled loads finish
    pub fn release_stalled(&self) {
        let (open, cvar) = &*self.stall_gate;
        *open.lock().unwrap() = true;
        cvar.notify_all();
    }

    /// Every playback command on these names fails (state is left untouched)
    pub fn failing_commands(mut self, names: &[&str]) -> Self {
        self.fail_commands.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.voices.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ops(&self, name: &str) -> Vec<VoiceOp> {
        self.record(name)
            .map(|r| r.lock().unwrap().ops.clone())
            .unwrap_or_default()
    }

    /// Number of `play` calls that reached the voice
    pub fn play_count(&self, name: &str) -> usize {
        self.ops(name)
            .iter()
            .filter(|op| matches!(op, VoiceOp::Play { .. }))
            .count()
    }

    pub fn state_of(&self, name: &str) -> PlayerState {
        self.record(name)
            .map(|r| r.lock().unwrap().state)
            .unwrap_or_default()
    }

    pub fn position_of(&self, name: &str) -> Duration {
        self.record(name)
            .map(|r| r.lock().unwrap().position)
            .unwrap_or_default()
    }

    pub fn releases(&self, name: &str) -> usize {
        self.record(name)
            .map(|r| r.lock().unwrap().releases)
            .unwrap_or_default()
    }

    fn record(&self, name: &str) -> Option<Arc<Mutex<VoiceRecord>>> {
        self.voices.lock().unwrap().get(name).cloned()
    }
}

impl SoundBackend for RecordingBackend {
    fn load(&self, asset: &SoundAsset) -> Result<Box<dyn Voice>> {
        if self.fail_loads.contains(&asset.name) {
            return Err(Error::Decode(format!("cannot decode '{}'", asset.name)));
        }
        if self.stall_loads.contains(&asset.name) {
            let (open, cvar) = &*self.stall_gate;
            let _open = cvar
                .wait_while(open.lock().unwrap(), |open| !*open)
                .unwrap();
        }
        let record = Arc::new(Mutex::new(VoiceRecord::default()));
        self.voices
            .lock()
            .unwrap()
            .insert(asset.name.clone(), Arc::clone(&record));
        Ok(Box::new(RecordingVoice {
            name: asset.name.clone(),
            record,
            fail: self.fail_commands.contains(&asset.name),
        }))
    }
}

struct RecordingVoice {
    name: String,
    record: Arc<Mutex<VoiceRecord>>,
    fail: bool,
}

impl RecordingVoice {
    fn apply(&mut self, op: VoiceOp) -> Result<()> {
        let mut record = self.record.lock().unwrap();
        record.ops.push(op);
        if self.fail {
            return Err(Error::Playback(format!("'{}' player is gone", self.name)));
        }
        match op {
            VoiceOp::Play { .. } => record.state = PlayerState::Playing,
            VoiceOp::Pause => record.state = PlayerState::Paused,
            VoiceOp::Stop => record.state = PlayerState::Idle,
            VoiceOp::Seek(position) => record.position = position,
            VoiceOp::Release => {}
        }
        Ok(())
    }
}

impl Voice for RecordingVoice {
    fn play(&mut self, looping: bool) -> Result<()> {
        self.apply(VoiceOp::Play { looping })
    }

    fn pause(&mut self) -> Result<()> {
        self.apply(VoiceOp::Pause)
    }

    fn stop(&mut self) -> Result<()> {
        self.apply(VoiceOp::Stop)
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.apply(VoiceOp::Seek(position))
    }

    fn state(&self) -> PlayerState {
        self.record.lock().unwrap().state
    }

    fn position(&self) -> Duration {
        self.record.lock().unwrap().position
    }

    fn release(&mut self) {
        let mut record = self.record.lock().unwrap();
        record.ops.push(VoiceOp::Release);
        record.releases += 1;
    }
}

/// Pool over the built-in catalog, initialized
pub async fn ready_pool(backend: Arc<RecordingBackend>) -> Arc<SoundPool> {
    let pool = Arc::new(SoundPool::new(backend));
    pool.initialize(default_catalog()).await;
    pool
}

/// Recording backend, ready pool, and an engine with a 5 s lead-in and 1 s tick
pub async fn start_engine() -> (Arc<RecordingBackend>, Arc<SoundPool>, SessionEngine) {
    start_engine_with(SessionSettings::default()).await
}

pub async fn start_engine_with(
    settings: SessionSettings,
) -> (Arc<RecordingBackend>, Arc<SoundPool>, SessionEngine) {
    let backend = Arc::new(RecordingBackend::new());
    let pool = ready_pool(Arc::clone(&backend)).await;
    let engine = SessionEngine::new(Arc::clone(&pool), settings);
    (backend, pool, engine)
}

/// Let the paused clock run forward
pub async fn advance(seconds: f64) {
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}

/// Wait (on the paused clock) until the engine has no active session
pub async fn wait_inactive(engine: &SessionEngine) {
    for _ in 0..100 {
        if !engine.is_active() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session still active");
}
