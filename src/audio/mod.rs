pub mod artifact;
pub mod backend;
pub mod capture;
pub mod file;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use artifact::AudioArtifact;
pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use capture::{ArtifactConsumer, AudioCaptureSession, CaptureState};
pub use file::{AudioFile, FileBackend};
