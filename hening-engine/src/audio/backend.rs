//! Mixer-backed sound backend
//!
//! Loads an asset by decoding its file, resampling it to the mixer rate, and
//! registering the buffer as a mixer voice.

use super::decoder::decode_file;
use super::mixer::{SharedMixer, VoiceId};
use super::resampler::resample;
use crate::error::{Error, Result};
use crate::sound::{PlayerState, SoundAsset, SoundBackend, Voice};
use std::path::PathBuf;
use std::sync::MutexGuard;
use std::time::Duration;
use tracing::debug;

/// Production [`SoundBackend`]: decoded assets played through a [`super::Mixer`]
pub struct MixerBackend {
    mixer: SharedMixer,
    assets_root: PathBuf,
}

impl MixerBackend {
    pub fn new(mixer: SharedMixer, assets_root: impl Into<PathBuf>) -> Self {
        Self {
            mixer,
            assets_root: assets_root.into(),
        }
    }

    fn resolve(&self, asset: &SoundAsset) -> Result<PathBuf> {
        let source = asset
            .source
            .as_ref()
            .ok_or_else(|| Error::NotFound(format!("'{}' has no source", asset.name)))?;
        if source.is_absolute() {
            Ok(source.clone())
        } else {
            Ok(self.assets_root.join(source))
        }
    }
}

impl SoundBackend for MixerBackend {
    fn load(&self, asset: &SoundAsset) -> Result<Box<dyn Voice>> {
        let path = self.resolve(asset)?;
        let decoded = decode_file(&path)?;

        let target_rate = lock(&self.mixer).sample_rate();
        let samples = resample(&decoded.samples, decoded.sample_rate, target_rate)?;

        let id = lock(&self.mixer).add_voice(samples);
        debug!("Registered '{}' as mixer voice {:?}", asset.name, id);

        Ok(Box::new(MixerVoice {
            id,
            mixer: SharedMixer::clone(&self.mixer),
            released: false,
        }))
    }
}

fn lock(mixer: &SharedMixer) -> MutexGuard<'_, super::Mixer> {
    mixer.lock().unwrap_or_else(|e| e.into_inner())
}

struct MixerVoice {
    id: VoiceId,
    mixer: SharedMixer,
    released: bool,
}

impl MixerVoice {
    fn check(&self) -> Result<()> {
        if self.released {
            Err(Error::Playback(format!("voice {:?} released", self.id)))
        } else {
            Ok(())
        }
    }
}

impl Voice for MixerVoice {
    fn play(&mut self, looping: bool) -> Result<()> {
        self.check()?;
        lock(&self.mixer).play(self.id, looping)
    }

    fn pause(&mut self) -> Result<()> {
        self.check()?;
        lock(&self.mixer).pause(self.id)
    }

    fn stop(&mut self) -> Result<()> {
        self.check()?;
        lock(&self.mixer).stop(self.id)
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.check()?;
        lock(&self.mixer).seek(self.id, position)
    }

    fn state(&self) -> PlayerState {
        lock(&self.mixer).state(self.id).unwrap_or_default()
    }

    fn position(&self) -> Duration {
        lock(&self.mixer).position(self.id).unwrap_or_default()
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            lock(&self.mixer).remove_voice(self.id);
        }
    }
}
