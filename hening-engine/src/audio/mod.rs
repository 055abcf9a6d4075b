//! Audio pipeline: decode, resample, mix, output
//!
//! Every asset is decoded once to interleaved stereo f32 at the mixer rate and
//! kept in RAM; the mixer sums the playing voices for whichever output pulls it.

pub mod backend;
pub mod decoder;
pub mod mixer;
pub mod output;
pub mod resampler;

pub use backend::MixerBackend;
pub use mixer::{Mixer, SharedMixer, VoiceId};
pub use output::{AudioOutput, OutputKind};
