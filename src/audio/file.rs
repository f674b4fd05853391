use super::backend::{AudioBackend, AudioBackendConfig, AudioChunk};
use super::pcm;
use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A decoded WAV file
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved 16-bit samples
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read audio samples")?,
            (SampleFormat::Int, bits) if bits > 16 => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (v >> (bits - 16)) as i16))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read audio samples")?,
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(pcm::f32_to_i16))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read audio samples")?,
            (format, bits) => bail!("Unsupported WAV format: {:?} {}-bit", format, bits),
        };

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels.max(1) as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Mono samples at (or as close as decimation gets to) `target_rate`
    pub fn to_mono(&self, target_rate: u32) -> (Vec<i16>, u32) {
        let mono = pcm::downmix_to_mono(&self.samples, self.channels);
        pcm::decimate(&mono, self.sample_rate, target_rate)
    }
}

/// Replays a WAV file as if it were a live source, one chunk per interval
pub struct WavFileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    paced: bool,
    task: Option<JoinHandle<()>>,
}

impl WavFileBackend {
    pub fn new(path: impl Into<PathBuf>, config: AudioBackendConfig) -> Self {
        Self {
            path: path.into(),
            config,
            paced: true,
            task: None,
        }
    }

    /// Emit all chunks as fast as the consumer takes them
    pub fn without_pacing(mut self) -> Self {
        self.paced = false;
        self
    }
}

#[async_trait::async_trait]
impl AudioBackend for WavFileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.is_capturing() {
            bail!("Already capturing");
        }

        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .context("WAV loader task failed")??;

        let (samples, sample_rate) = file.to_mono(self.config.target_sample_rate);
        let chunk_len = pcm::samples_per_chunk(sample_rate, self.config.chunk_ms);
        let chunk_ms = self.config.chunk_ms;
        let paced = self.paced;

        info!(
            "Replaying {} at {}Hz in {}ms chunks",
            file.path, sample_rate, chunk_ms
        );

        let (tx, rx) = mpsc::channel(32);

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(chunk_ms.max(1)));

            for (index, chunk) in samples.chunks(chunk_len).enumerate() {
                if paced {
                    interval.tick().await;
                }

                let chunk = AudioChunk {
                    data: pcm::to_pcm_bytes(chunk),
                    sample_rate,
                    timestamp_ms: index as u64 * chunk_ms,
                };

                if tx.send(chunk).await.is_err() {
                    break;
                }
            }

            debug!("WAV replay finished");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("WAV replay stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}
