// Integration tests for WAV replay and PCM helpers
//
// Test files are generated with hound into a temp directory.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use voiceform::audio::pcm::{decimate, downmix_to_mono, samples_per_chunk, to_pcm_bytes};
use voiceform::audio::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioSource, WavFileBackend};

/// Write a 16-bit WAV where every frame holds `value` on each channel
fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, frames: usize, value: i16) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..frames * channels as usize {
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "stereo.wav", 48000, 2, 24000, 100);

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 48000);
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.samples.len(), 48000);
    assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
    assert!(audio.path.contains("stereo.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open("/nonexistent/path/to/audio.wav");
    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_to_mono_downmixes_and_decimates() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "stereo.wav", 48000, 2, 4800, 100);

    let (mono, rate) = AudioFile::open(&path)?.to_mono(16000);

    assert_eq!(rate, 16000);
    assert_eq!(mono.len(), 1600);
    assert!(mono.iter().all(|&s| s == 200), "Channels are summed");

    Ok(())
}

#[test]
fn test_pcm_helpers() {
    assert_eq!(downmix_to_mono(&[1, 2, 3, 4], 1), vec![1, 2, 3, 4]);
    assert_eq!(downmix_to_mono(&[1, 2, 3, 4], 2), vec![3, 7]);
    assert_eq!(downmix_to_mono(&[i16::MAX, i16::MAX], 2), vec![i16::MAX], "Clamped");

    assert_eq!(decimate(&[1, 2, 3, 4, 5, 6], 48000, 16000), (vec![1, 4], 16000));
    assert_eq!(decimate(&[1, 2, 3], 16000, 16000), (vec![1, 2, 3], 16000));
    assert_eq!(decimate(&[1, 2, 3], 8000, 16000), (vec![1, 2, 3], 8000), "Never upsamples");

    assert_eq!(to_pcm_bytes(&[1, -2]), vec![0x01, 0x00, 0xFE, 0xFF]);

    assert_eq!(samples_per_chunk(16000, 250), 4000);
    assert_eq!(samples_per_chunk(16000, 0), 1);
}

#[tokio::test]
async fn test_wav_backend_replays_in_chunks() -> Result<()> {
    let dir = TempDir::new()?;
    // 0.6s of mono audio at 16kHz: two full 250ms chunks and a short tail
    let path = write_wav(dir.path(), "mono.wav", 16000, 1, 9600, 7);

    let config = AudioBackendConfig::default();
    let mut backend = WavFileBackend::new(&path, config).without_pacing();
    let mut chunks = backend.start().await?;

    let mut sizes = Vec::new();
    let mut timestamps = Vec::new();
    while let Some(chunk) = chunks.recv().await {
        assert_eq!(chunk.sample_rate, 16000);
        sizes.push(chunk.data.len());
        timestamps.push(chunk.timestamp_ms);
    }

    assert_eq!(sizes, vec![8000, 8000, 3200]);
    assert_eq!(timestamps, vec![0, 250, 500]);

    backend.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_factory_file_source() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "short.wav", 16000, 1, 1600, 1);

    let mut backend = AudioBackendFactory::create(AudioSource::File(path), AudioBackendConfig::default())?;
    assert_eq!(backend.name(), "WAV file");
    assert!(!backend.is_capturing());

    let mut chunks = backend.start().await?;
    let first = chunks.recv().await.expect("one chunk expected");
    assert_eq!(first.data.len(), 3200);

    backend.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_missing_file_fails_on_start() {
    let mut backend = AudioBackendFactory::create(
        AudioSource::File(PathBuf::from("/nonexistent/missing.wav")),
        AudioBackendConfig::default(),
    )
    .unwrap();

    assert!(backend.start().await.is_err());
}
