//! Audio decoder using symphonia
//!
//! Decodes an asset file (MP3, FLAC, AAC, Vorbis, WAV) to interleaved stereo f32.

use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Fully decoded asset
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved stereo samples [L, R, L, R, ...]
    pub samples: Vec<f32>,
    /// Source sample rate (before resampling)
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Decode an entire audio file.
///
/// Mono sources are duplicated to both channels; sources with more than two
/// channels keep their first two.
///
/// # Errors
/// - Failed to open file
/// - Unsupported audio format
/// - No decodable audio in the file
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    debug!("Decoding {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                warn!("Error reading packet from {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                push_stereo(buf.samples(), channels, &mut samples);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packet, skip it
                warn!("Decode error in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(Error::Decode(format!("Decoder failed: {}", e)));
            }
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode(format!("No audio decoded from {}", path.display())));
    }

    debug!(
        "Decoded {} frames at {}Hz from {}",
        samples.len() / 2,
        sample_rate,
        path.display()
    );

    Ok(DecodedAudio { samples, sample_rate })
}

/// Append interleaved samples of any channel count as stereo
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            for &sample in interleaved {
                output.push(sample);
                output.push(sample);
            }
        }
        n => {
            for frame in interleaved.chunks_exact(n) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}
