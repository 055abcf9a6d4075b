//! Voice mixer
//!
//! Holds every decoded asset as a voice and sums the playing ones into an
//! interleaved stereo output buffer. Looping voices wrap at end of buffer;
//! one-shot voices return to Idle at position zero when they run out.

use crate::error::{Error, Result};
use crate::sound::PlayerState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mixer shared between the voices, the output, and the backend
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Voice identifier within one mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

#[derive(Debug)]
struct VoiceSlot {
    samples: Arc<Vec<f32>>,
    frame: usize,
    state: PlayerState,
    looping: bool,
}

impl VoiceSlot {
    fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Sums playing voices at a fixed sample rate
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    voices: HashMap<VoiceId, VoiceSlot>,
    next_id: u64,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            voices: HashMap::new(),
            next_id: 0,
        }
    }

    /// Create a mixer wrapped for sharing
    pub fn shared(sample_rate: u32) -> SharedMixer {
        Arc::new(Mutex::new(Self::new(sample_rate)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Register decoded interleaved stereo samples (already at the mixer rate)
    pub fn add_voice(&mut self, samples: Vec<f32>) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.insert(
            id,
            VoiceSlot {
                samples: Arc::new(samples),
                frame: 0,
                state: PlayerState::Idle,
                looping: false,
            },
        );
        id
    }

    pub fn remove_voice(&mut self, id: VoiceId) -> bool {
        self.voices.remove(&id).is_some()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Number of voices currently producing sound
    pub fn playing_count(&self) -> usize {
        self.voices
            .values()
            .filter(|v| v.state == PlayerState::Playing)
            .count()
    }

    pub fn play(&mut self, id: VoiceId, looping: bool) -> Result<()> {
        let voice = self.voice_mut(id)?;
        voice.looping = looping;
        voice.state = PlayerState::Playing;
        Ok(())
    }

    pub fn pause(&mut self, id: VoiceId) -> Result<()> {
        let voice = self.voice_mut(id)?;
        if voice.state == PlayerState::Playing {
            voice.state = PlayerState::Paused;
        }
        Ok(())
    }

    pub fn stop(&mut self, id: VoiceId) -> Result<()> {
        self.voice_mut(id)?.state = PlayerState::Idle;
        Ok(())
    }

    pub fn seek(&mut self, id: VoiceId, position: Duration) -> Result<()> {
        let rate = self.sample_rate as u128;
        let voice = self.voice_mut(id)?;
        let frame = (position.as_millis() * rate / 1000) as usize;
        voice.frame = frame.min(voice.frames());
        Ok(())
    }

    pub fn state(&self, id: VoiceId) -> Option<PlayerState> {
        self.voices.get(&id).map(|v| v.state)
    }

    pub fn position(&self, id: VoiceId) -> Option<Duration> {
        self.voices.get(&id).map(|v| {
            Duration::from_millis(v.frame as u64 * 1000 / self.sample_rate.max(1) as u64)
        })
    }

    /// Render interleaved stereo frames into `out`, advancing playing voices
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let out_frames = out.len() / 2;

        for voice in self.voices.values_mut() {
            if voice.state != PlayerState::Playing {
                continue;
            }
            let total = voice.frames();
            if total == 0 {
                voice.state = PlayerState::Idle;
                continue;
            }

            for i in 0..out_frames {
                if voice.frame >= total {
                    if voice.looping {
                        voice.frame = 0;
                    } else {
                        voice.state = PlayerState::Idle;
                        voice.frame = 0;
                        break;
                    }
                }
                out[i * 2] += voice.samples[voice.frame * 2];
                out[i * 2 + 1] += voice.samples[voice.frame * 2 + 1];
                voice.frame += 1;
            }

            // One-shot that ended exactly at the buffer boundary
            if voice.state == PlayerState::Playing && !voice.looping && voice.frame >= total {
                voice.state = PlayerState::Idle;
                voice.frame = 0;
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    fn voice_mut(&mut self, id: VoiceId) -> Result<&mut VoiceSlot> {
        self.voices
            .get_mut(&id)
            .ok_or_else(|| Error::Playback(format!("voice {:?} not loaded", id)))
    }
}
