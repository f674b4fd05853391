pub mod backend;
pub mod bridge;
pub mod file;
pub mod pcm;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioChunk, AudioSource};
pub use bridge::AudioCaptureBridge;
pub use file::{AudioFile, WavFileBackend};

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneBackend;
