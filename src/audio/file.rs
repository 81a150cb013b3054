use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// A 16-bit PCM WAV file loaded into memory
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;

        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
            bail!(
                "{} is {}-bit {:?}; only 16-bit integer PCM can be replayed",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode WAV samples")?;

        let frames_per_channel = samples.len() as f64 / spec.channels.max(1) as f64;
        let duration_seconds = frames_per_channel / spec.sample_rate.max(1) as f64;

        debug!(
            "Loaded {}: {:.2}s at {}Hz x{}",
            path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the samples into consecutive frames of `frame_ms` each
    pub fn frames(&self, frame_ms: u64) -> Vec<AudioFrame> {
        let channels = self.channels.max(1) as u64;
        let per_frame = ((self.sample_rate as u64 * frame_ms / 1000).max(1) * channels) as usize;

        self.samples
            .chunks(per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect()
    }
}

/// Replays a WAV file as if it were a live input device
///
/// Frames are emitted in real time (one per buffer period) unless pacing is
/// turned off. When the file runs out the stream simply ends.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    paced: bool,
    replay: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, config: AudioBackendConfig) -> Self {
        Self {
            path: path.into(),
            config,
            paced: true,
            replay: None,
        }
    }

    /// Emit all frames as fast as the receiver takes them
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.replay.is_some() {
            bail!("Already capturing");
        }

        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .context("Audio file reader panicked")??;

        let frame_ms = self.config.buffer_duration_ms.max(1);
        let frames = audio.frames(frame_ms);
        let paced = self.paced;
        let (tx, rx) = mpsc::channel(64);

        info!(
            "File capture started: {} ({} frames of {}ms)",
            audio.path,
            frames.len(),
            frame_ms
        );

        self.replay = Some(tokio::spawn(async move {
            for frame in frames {
                if tx.send(frame).await.is_err() {
                    break;
                }
                if paced {
                    tokio::time::sleep(Duration::from_millis(frame_ms)).await;
                }
            }
            debug!("File replay finished");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(replay) = self.replay.take() {
            replay.abort();
            info!("File capture stopped: {}", self.path.display());
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.replay.is_some()
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(replay) = self.replay.take() {
            replay.abort();
        }
    }
}
