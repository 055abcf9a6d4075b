//! Audio output stages
//!
//! The mixer is pulled either by a cpal device stream (feature
//! `device-output`) or by a null output that renders in real time and
//! discards the samples, so voice positions and one-shot completion behave
//! the same on a headless host.

use super::mixer::{Mixer, SharedMixer};
use super::resampler::TARGET_SAMPLE_RATE;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::sync::MutexGuard;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Render period of the null output
const NULL_RENDER_PERIOD: Duration = Duration::from_millis(20);

/// Output selection from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Render and discard
    #[default]
    Null,
    /// Default (or named) audio device via cpal
    Device,
}

fn lock(mixer: &SharedMixer) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(|e| e.into_inner())
}

/// Active output stage
pub enum AudioOutput {
    Null(NullOutput),
    #[cfg(feature = "device-output")]
    Device(device::DeviceOutput),
}

impl AudioOutput {
    /// Open an output of the requested kind
    pub fn open(kind: OutputKind, device_name: Option<String>) -> Result<Self> {
        match kind {
            OutputKind::Null => Ok(AudioOutput::Null(NullOutput::new(TARGET_SAMPLE_RATE))),
            #[cfg(feature = "device-output")]
            OutputKind::Device => Ok(AudioOutput::Device(device::DeviceOutput::open(device_name)?)),
            #[cfg(not(feature = "device-output"))]
            OutputKind::Device => {
                let _ = device_name;
                Err(Error::AudioOutput(
                    "built without the device-output feature".to_string(),
                ))
            }
        }
    }

    /// Sample rate the mixer must run at for this output
    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioOutput::Null(null) => null.sample_rate,
            #[cfg(feature = "device-output")]
            AudioOutput::Device(dev) => dev.sample_rate(),
        }
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            AudioOutput::Null(_) => OutputKind::Null,
            #[cfg(feature = "device-output")]
            AudioOutput::Device(_) => OutputKind::Device,
        }
    }

    /// Start pulling audio from the mixer
    pub fn start(&mut self, mixer: SharedMixer) -> Result<()> {
        let mixer_rate = lock(&mixer).sample_rate();
        if mixer_rate != self.sample_rate() {
            return Err(Error::AudioOutput(format!(
                "mixer runs at {}Hz but output expects {}Hz",
                mixer_rate,
                self.sample_rate()
            )));
        }

        match self {
            AudioOutput::Null(null) => {
                null.start(mixer);
                Ok(())
            }
            #[cfg(feature = "device-output")]
            AudioOutput::Device(dev) => dev.start(mixer),
        }
    }
}

/// Real-time render loop with no device behind it
pub struct NullOutput {
    sample_rate: u32,
    task: Option<JoinHandle<()>>,
}

impl NullOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            task: None,
        }
    }

    /// Spawn the render loop. Must be called from within a tokio runtime.
    pub fn start(&mut self, mixer: SharedMixer) {
        if self.task.is_some() {
            debug!("Null output already running");
            return;
        }

        let rate = self.sample_rate as f64;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(NULL_RENDER_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            let mut carry = 0.0f64;
            let mut scratch: Vec<f32> = Vec::new();

            loop {
                ticker.tick().await;
                let now = Instant::now();
                let exact = (now - last).as_secs_f64() * rate + carry;
                let frames = exact.floor();
                carry = exact - frames;
                last = now;

                scratch.resize(frames as usize * 2, 0.0);
                lock(&mixer).render(&mut scratch);
            }
        }));
        info!("Null audio output started at {}Hz", self.sample_rate);
    }
}

impl Drop for NullOutput {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(feature = "device-output")]
mod device {
    use super::{lock, SharedMixer};
    use crate::error::{Error, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Device, SampleFormat, Stream, StreamConfig};
    use tracing::{debug, error, info, warn};

    /// Audio device output using cpal
    pub struct DeviceOutput {
        device: Device,
        config: StreamConfig,
        sample_format: SampleFormat,
        stream: Option<Stream>,
    }

    impl DeviceOutput {
        /// Open the named device, falling back to the default device
        pub fn open(device_name: Option<String>) -> Result<Self> {
            let host = cpal::default_host();

            let requested = match device_name.as_ref() {
                Some(name) => host
                    .output_devices()
                    .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
                    .find(|d| d.name().ok().as_ref() == Some(name)),
                None => None,
            };

            let device = match requested {
                Some(dev) => dev,
                None => {
                    if let Some(name) = device_name.as_ref() {
                        warn!("Requested device '{}' not found, falling back to default device", name);
                    }
                    host.default_output_device()
                        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?
                }
            };

            info!(
                "Using audio device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );

            let (config, sample_format) = Self::get_best_config(&device)?;
            debug!(
                "Audio config: sample_rate={}, channels={}, format={:?}",
                config.sample_rate.0, config.channels, sample_format
            );

            Ok(Self {
                device,
                config,
                sample_format,
                stream: None,
            })
        }

        pub fn sample_rate(&self) -> u32 {
            self.config.sample_rate.0
        }

        /// Prefer 44.1kHz stereo f32, else the device default
        fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
            let mut supported = device
                .supported_output_configs()
                .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

            let preferred = supported.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate().0 <= super::TARGET_SAMPLE_RATE
                    && c.max_sample_rate().0 >= super::TARGET_SAMPLE_RATE
                    && c.sample_format() == SampleFormat::F32
            });

            if let Some(c) = preferred {
                let format = c.sample_format();
                let config = c.with_sample_rate(cpal::SampleRate(super::TARGET_SAMPLE_RATE)).config();
                return Ok((config, format));
            }

            let fallback = device
                .default_output_config()
                .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
            Ok((fallback.config(), fallback.sample_format()))
        }

        pub fn start(&mut self, mixer: SharedMixer) -> Result<()> {
            let channels = self.config.channels as usize;
            let err_fn = |err| error!("Audio stream error: {}", err);

            let stream = match self.sample_format {
                SampleFormat::F32 => {
                    let mut scratch = Vec::new();
                    self.device.build_output_stream(
                        &self.config,
                        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                            fill(&mixer, &mut scratch, data, channels, |s| s);
                        },
                        err_fn,
                        None,
                    )
                }
                SampleFormat::I16 => {
                    let mut scratch = Vec::new();
                    self.device.build_output_stream(
                        &self.config,
                        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                            fill(&mixer, &mut scratch, data, channels, |s| (s * i16::MAX as f32) as i16);
                        },
                        err_fn,
                        None,
                    )
                }
                SampleFormat::U16 => {
                    let mut scratch = Vec::new();
                    self.device.build_output_stream(
                        &self.config,
                        move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                            fill(&mixer, &mut scratch, data, channels, |s| ((s + 1.0) * 32767.5) as u16);
                        },
                        err_fn,
                        None,
                    )
                }
                other => {
                    return Err(Error::AudioOutput(format!("Unsupported sample format: {:?}", other)));
                }
            }
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

            stream
                .play()
                .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;
            self.stream = Some(stream);
            info!("Audio stream started");
            Ok(())
        }
    }

    /// Render the mixer into a device buffer of any channel count
    fn fill<T: Copy + Default>(
        mixer: &SharedMixer,
        scratch: &mut Vec<f32>,
        data: &mut [T],
        channels: usize,
        convert: impl Fn(f32) -> T,
    ) {
        let frames = data.len() / channels.max(1);
        scratch.resize(frames * 2, 0.0);
        lock(mixer).render(scratch);

        for (frame, stereo) in data.chunks_mut(channels).zip(scratch.chunks_exact(2)) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match ch {
                    0 => convert(stereo[0]),
                    1 => convert(stereo[1]),
                    _ => T::default(),
                };
            }
        }
    }
}
