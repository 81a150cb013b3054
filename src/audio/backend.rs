use anyhow::{bail, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;

/// One buffer of interleaved 16-bit PCM from an input device
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Offset from the start of the take
    pub timestamp_ms: u64,
}

/// Recording format and device buffer period
///
/// Frames are averaged down to `target_channels` and resampled to exactly
/// `target_sample_rate` before they are encoded.
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    pub target_sample_rate: u32,
    pub target_channels: u16,
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000,
            target_channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// Source of recorded speech
///
/// - `MicrophoneBackend`: default cpal input device (`microphone` feature)
/// - `FileBackend`: a WAV file replayed as live input
///
/// `start` fails when the device is missing or access is refused. Dropping
/// the frame sender ends the take.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire the device and stream its frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Release the device
    async fn stop(&mut self) -> Result<()>;

    fn is_capturing(&self) -> bool;

    /// Human-readable device name for logs
    fn name(&self) -> &str;
}

/// Builds the backend named by the configured `AudioSource`
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::MicrophoneBackend;
                    Ok(Box::new(MicrophoneBackend::new(config)))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = config;
                    Ok(Box::new(UnavailableBackend {
                        reason: "built without the `microphone` feature",
                    }))
                }
            }

            AudioSource::File(path) => {
                use super::file::FileBackend;
                Ok(Box::new(FileBackend::new(path, config)))
            }
        }
    }
}

/// Backend for a source this build cannot capture from
///
/// Every `start` fails, which callers see as capture being denied.
pub struct UnavailableBackend {
    reason: &'static str,
}

#[async_trait::async_trait]
impl AudioBackend for UnavailableBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        bail!("No input device available: {}", self.reason)
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Where recordings come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Default input device
    Microphone,
    /// WAV file replayed as if it were live input
    File(PathBuf),
}

impl FromStr for AudioSource {
    type Err = anyhow::Error;

    /// `"microphone"` or `"file:<path>"`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("microphone") {
            return Ok(AudioSource::Microphone);
        }
        match s.strip_prefix("file:") {
            Some(path) if !path.is_empty() => Ok(AudioSource::File(PathBuf::from(path))),
            _ => bail!("Unknown audio source: {:?}", s),
        }
    }
}
