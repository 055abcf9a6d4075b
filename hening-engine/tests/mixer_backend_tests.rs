//! Decoding real files into the mixer through the pool

use hening_engine::audio::{Mixer, MixerBackend};
use hening_engine::sound::SoundBackend;
use hening_engine::{PlayerState, SoundAsset, SoundCategory, SoundPool};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Write a mono 16-bit sine WAV
fn write_tone(path: &Path, sample_rate: u32, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let samples = (sample_rate as f32 * seconds) as usize;
    for n in 0..samples {
        let t = n as f32 / sample_rate as f32;
        let value = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_one_shot_voice_plays_to_end() {
    let dir = TempDir::new().unwrap();
    write_tone(&dir.path().join("tone.wav"), 44100, 0.5);

    let mixer = Mixer::shared(44100);
    let backend = MixerBackend::new(Arc::clone(&mixer), dir.path());
    let mut voice = backend
        .load(&SoundAsset::new("Tone", SoundCategory::Bell, "tone.wav"))
        .unwrap();

    voice.play(false).unwrap();
    assert_eq!(voice.state(), PlayerState::Playing);

    let mut out = vec![0.0f32; 11025 * 2];
    mixer.lock().unwrap().render(&mut out);
    assert!(out.iter().any(|s| s.abs() > 0.1));
    assert_eq!(voice.position(), Duration::from_millis(250));

    let mut out = vec![0.0f32; 11100 * 2];
    mixer.lock().unwrap().render(&mut out);
    assert_eq!(voice.state(), PlayerState::Idle);
    assert_eq!(voice.position(), Duration::ZERO);

    voice.release();
    assert_eq!(mixer.lock().unwrap().voice_count(), 0);
    assert!(voice.play(false).is_err());
}

#[test]
fn test_lower_rate_file_is_resampled() {
    let dir = TempDir::new().unwrap();
    write_tone(&dir.path().join("low.wav"), 22050, 1.0);

    let mixer = Mixer::shared(44100);
    let backend = MixerBackend::new(Arc::clone(&mixer), dir.path());
    let mut voice = backend
        .load(&SoundAsset::new("Low", SoundCategory::Ambiance, "low.wav"))
        .unwrap();

    // Looping voice keeps going past its own length
    voice.play(true).unwrap();
    let mut out = vec![0.0f32; 44100 * 3];
    mixer.lock().unwrap().render(&mut out);
    assert_eq!(voice.state(), PlayerState::Playing);

    // About one second of audio at the mixer rate
    voice.stop().unwrap();
    voice.seek(Duration::from_secs(5)).unwrap();
    let end = voice.position();
    assert!(end > Duration::from_millis(950) && end <= Duration::from_millis(1050), "{:?}", end);
}

#[test]
fn test_missing_file_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let backend = MixerBackend::new(Mixer::shared(44100), dir.path());

    let result = backend.load(&SoundAsset::new("Gone", SoundCategory::Bell, "gone.mp3"));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_pool_over_mixer_backend() {
    let dir = TempDir::new().unwrap();
    write_tone(&dir.path().join("tone.wav"), 44100, 0.2);

    let mixer = Mixer::shared(44100);
    let backend = Arc::new(MixerBackend::new(Arc::clone(&mixer), dir.path()));
    let pool = SoundPool::new(backend);

    let report = pool
        .initialize(vec![
            SoundAsset::silent(SoundCategory::Bell),
            SoundAsset::new("Tone", SoundCategory::Bell, "tone.wav"),
            SoundAsset::new("Missing", SoundCategory::Bell, "missing.wav"),
        ])
        .await;
    assert_eq!(report.loaded, 1);
    assert_eq!(report.silent, 1);
    assert_eq!(report.failed, vec!["Missing".to_string()]);
    assert_eq!(mixer.lock().unwrap().voice_count(), 1);

    let tone = pool.get("Tone");
    tone.play_from_start();
    assert_eq!(tone.query_state().await, PlayerState::Playing);
    assert_eq!(mixer.lock().unwrap().playing_count(), 1);

    tone.stop();
    tone.settle().await;
    assert_eq!(mixer.lock().unwrap().playing_count(), 0);

    pool.dispose().await;
    assert_eq!(mixer.lock().unwrap().voice_count(), 0);
}
