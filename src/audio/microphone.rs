// Microphone backend using cpal
//
// cpal streams are not Send, so each capture owns a dedicated thread that
// builds the stream, plays it until told to stop, then drops it to release
// the device.

use super::backend::{AudioBackend, AudioBackendConfig, AudioChunk};
use super::pcm;
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    preferred_device: Option<String>,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig, preferred_device: Option<String>) -> Self {
        Self {
            config,
            preferred_device,
            stop_tx: None,
            thread: None,
        }
    }

    /// Input device names, for a CLI selector
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.is_capturing() {
            bail!("Already capturing");
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let config = self.config.clone();
        let preferred = self.preferred_device.clone();

        let handle = thread::Builder::new()
            .name("voiceform-mic".to_string())
            .spawn(move || capture_thread(config, preferred, chunk_tx, ready_tx, stop_rx))
            .context("Failed to spawn microphone thread")?;

        // Device and permission errors surface here
        ready_rx
            .await
            .map_err(|_| anyhow!("microphone thread exited before starting"))??;

        self.stop_tx = Some(stop_tx);
        self.thread = Some(handle);

        info!("Microphone capture started");
        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        // Dropping the sender wakes the capture thread, which drops the stream
        drop(self.stop_tx.take());

        if let Some(handle) = self.thread.take() {
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .context("Failed to join microphone thread")?
                .map_err(|_| anyhow!("microphone thread panicked"))?;
            info!("Microphone released");
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

fn capture_thread(
    config: AudioBackendConfig,
    preferred: Option<String>,
    chunk_tx: mpsc::Sender<AudioChunk>,
    ready_tx: oneshot::Sender<Result<()>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let stream = match open_stream(&config, preferred.as_deref(), chunk_tx) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(anyhow!("failed to start input stream: {}", e)));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Blocks until stop() drops the sender
    let _ = stop_rx.recv();

    if let Err(e) = stream.pause() {
        warn!("Failed to pause input stream: {}", e);
    }
    drop(stream);
}

/// Accumulates device-rate mono samples into fixed-duration chunks
struct ChunkAccumulator {
    buffer: Vec<i16>,
    device_rate: u32,
    target_rate: u32,
    samples_per_chunk: usize,
    started: Instant,
    tx: mpsc::Sender<AudioChunk>,
}

impl ChunkAccumulator {
    fn push(&mut self, mono: &[i16]) {
        self.buffer.extend_from_slice(mono);

        while self.buffer.len() >= self.samples_per_chunk {
            let raw: Vec<i16> = self.buffer.drain(..self.samples_per_chunk).collect();
            let (samples, sample_rate) = pcm::decimate(&raw, self.device_rate, self.target_rate);
            let chunk = AudioChunk {
                data: pcm::to_pcm_bytes(&samples),
                sample_rate,
                timestamp_ms: self.started.elapsed().as_millis() as u64,
            };

            // Never block the audio callback
            if self.tx.try_send(chunk).is_err() {
                warn!("Dropping microphone chunk: consumer is behind");
            }
        }
    }
}

fn open_stream(
    config: &AudioBackendConfig,
    preferred: Option<&str>,
    chunk_tx: mpsc::Sender<AudioChunk>,
) -> Result<Stream> {
    let host = cpal::default_host();
    let device = match preferred {
        Some(name) => host
            .input_devices()
            .context("no input devices available")?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow!("input device '{}' not found", name))?,
        None => host
            .default_input_device()
            .context("no default input device available")?,
    };

    let default_config = device
        .default_input_config()
        .context("microphone unavailable or permission denied")?;
    let format = default_config.sample_format();
    let stream_config: StreamConfig = default_config.into();
    let device_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels.max(1);

    info!(
        "Microphone {}: {:?} {}Hz {}ch",
        device.name().unwrap_or_else(|_| "unknown".to_string()),
        format,
        device_rate,
        channels
    );

    let accumulator = Arc::new(Mutex::new(ChunkAccumulator {
        buffer: Vec::new(),
        device_rate,
        target_rate: config.target_sample_rate,
        samples_per_chunk: pcm::samples_per_chunk(device_rate, config.chunk_ms),
        started: Instant::now(),
        tx: chunk_tx,
    }));

    let err_fn = |err| warn!("Input stream error: {}", err);

    let stream = match format {
        SampleFormat::I16 => {
            let acc = Arc::clone(&accumulator);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    if let Ok(mut acc) = acc.lock() {
                        acc.push(&pcm::downmix_to_mono(data, channels));
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::F32 => {
            let acc = Arc::clone(&accumulator);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let converted: Vec<i16> = data.iter().map(|&s| pcm::f32_to_i16(s)).collect();
                    if let Ok(mut acc) = acc.lock() {
                        acc.push(&pcm::downmix_to_mono(&converted, channels));
                    }
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let acc = Arc::clone(&accumulator);
            device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| {
                    let converted: Vec<i16> = data.iter().map(|&s| (s as i32 - 32_768) as i16).collect();
                    if let Ok(mut acc) = acc.lock() {
                        acc.push(&pcm::downmix_to_mono(&converted, channels));
                    }
                },
                err_fn,
                None,
            )?
        }
        other => bail!("unsupported sample format: {:?}", other),
    };

    Ok(stream)
}
