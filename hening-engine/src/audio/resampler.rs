//! Audio resampling using rubato
//!
//! Converts decoded assets to the mixer's sample rate at load time.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Default mixer sample rate
pub const TARGET_SAMPLE_RATE: u32 = 44100;

const CHANNELS: usize = 2;

/// Resample interleaved stereo audio from `input_rate` to `output_rate`.
///
/// Returns a copy when the rates already match.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

    let planar_input = deinterleave(input);
    let input_frames = planar_input[0].len();

    // FastFixedIn: good quality/performance tradeoff for short assets
    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        CHANNELS,
    )
    .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

    let mut planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

    // Flush the filter so the tail survives, then drop the leading delay
    let flushed = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| Error::Decode(format!("Resampler flush failed: {}", e)))?;
    let delay = resampler.output_delay();
    let expected = (input_frames as f64 * output_rate as f64 / input_rate as f64).round() as usize;
    for (channel, tail) in planar_output.iter_mut().zip(flushed) {
        channel.extend(tail);
        channel.drain(..delay.min(channel.len()));
        channel.truncate(expected);
    }

    let output = interleave(&planar_output);
    debug!(
        "Resampled {} input frames to {} output frames",
        input_frames,
        output.len() / CHANNELS
    );
    Ok(output)
}

fn deinterleave(input: &[f32]) -> Vec<Vec<f32>> {
    let frames = input.len() / CHANNELS;
    let mut planar = vec![Vec::with_capacity(frames); CHANNELS];
    for frame in input.chunks_exact(CHANNELS) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(|c| c.len()).unwrap_or(0);
    let mut output = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in planar {
            output.push(channel[i]);
        }
    }
    output
}
