use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// A captured chunk of audio, forwarded verbatim as one binary frame
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Encoded audio (16-bit little-endian mono PCM for the built-in backends)
    pub data: Vec<u8>,
    /// Sample rate of `data` in Hz
    pub sample_rate: u32,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backends
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (decimated down to when the source is faster)
    pub target_sample_rate: u32,
    /// Chunk interval in milliseconds
    pub chunk_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // Recognizer default
            chunk_ms: 250,             // 250ms chunks
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal default input device (`microphone` feature)
/// - File: replay a WAV file in real time (testing, demos)
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire the device and start capturing.
    ///
    /// Permission or device failures are returned here. The receiver yields
    /// one chunk per interval until `stop` is called or the source runs dry.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend based on source and configuration
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone { device } => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneBackend;
                    Ok(Box::new(MicrophoneBackend::new(config, device)))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = (config, device);
                    anyhow::bail!("Microphone capture requires the `microphone` feature")
                }
            }

            AudioSource::File(path) => {
                use super::file::WavFileBackend;
                Ok(Box::new(WavFileBackend::new(path, config)))
            }
        }
    }
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input; the default device unless one is named
    Microphone { device: Option<String> },
    /// WAV file input
    File(PathBuf),
}
