use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::artifact::AudioArtifact;
use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::lifecycle::ChatError;

/// Receives each finished recording
pub type ArtifactConsumer = Arc<dyn Fn(AudioArtifact) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

struct ActiveCapture {
    stop_tx: oneshot::Sender<()>,
    collector: JoinHandle<Vec<AudioFrame>>,
    started_at: Instant,
}

/// Start/stop recorder that turns a device stream into one artifact per take
///
/// `start` while recording and `stop` while idle are no-ops. The device is
/// held only between a successful `start` and the next `stop`.
pub struct AudioCaptureSession {
    backend: Box<dyn AudioBackend>,
    config: AudioBackendConfig,
    consumer: ArtifactConsumer,
    active: Option<ActiveCapture>,
}

impl AudioCaptureSession {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: AudioBackendConfig,
        consumer: ArtifactConsumer,
    ) -> Self {
        Self {
            backend,
            config,
            consumer,
            active: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        if self.active.is_some() {
            CaptureState::Recording
        } else {
            CaptureState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Acquire the device and begin buffering frames
    pub async fn start(&mut self) -> Result<(), ChatError> {
        if self.active.is_some() {
            warn!("Recording already started");
            return Ok(());
        }

        let mut audio_rx = match self.backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Could not start recording on {}: {:#}", self.backend.name(), e);
                return Err(ChatError::CaptureDenied(e));
            }
        };

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let target = self.config.clone();

        let collector = tokio::spawn(async move {
            let mut normalizer = FrameNormalizer::new(&target);
            let mut frames = Vec::new();

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    frame = audio_rx.recv() => match frame {
                        Some(frame) => frames.push(normalizer.process(frame)),
                        None => return frames,
                    },
                }
            }

            // Keep whatever was already queued when stop arrived
            while let Ok(frame) = audio_rx.try_recv() {
                frames.push(normalizer.process(frame));
            }

            frames
        });

        self.active = Some(ActiveCapture {
            stop_tx,
            collector,
            started_at: Instant::now(),
        });

        info!("Recording started on {}", self.backend.name());
        Ok(())
    }

    /// Release the device, finalize the take and hand it to the consumer
    ///
    /// Returns whether an artifact was produced.
    pub async fn stop(&mut self) -> Result<bool, ChatError> {
        let Some(active) = self.active.take() else {
            return Ok(false);
        };

        if let Err(e) = self.backend.stop().await {
            error!("Failed to stop {}: {:#}", self.backend.name(), e);
        }

        // The collector may already be done if the stream ended on its own
        let _ = active.stop_tx.send(());

        let frames = active
            .collector
            .await
            .map_err(|e| ChatError::RecordingFailed(anyhow::anyhow!("collector task failed: {}", e)))?;

        if frames.is_empty() {
            warn!("Recording stopped without any audio");
        }

        let (sample_rate, channels) = frames
            .first()
            .map(|f| (f.sample_rate, f.channels))
            .unwrap_or((self.config.target_sample_rate, self.config.target_channels));

        let artifact = AudioArtifact::encode_wav(&frames, sample_rate, channels)
            .map_err(ChatError::RecordingFailed)?;

        info!(
            "Recording stopped after {:.1}s: {}ms of audio, {} bytes",
            active.started_at.elapsed().as_secs_f64(),
            artifact.duration_ms,
            artifact.data.len()
        );

        (self.consumer)(artifact);
        Ok(true)
    }
}

impl Drop for AudioCaptureSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.collector.abort();
        }
    }
}

/// Brings frames to the configured rate and channel layout
///
/// One normalizer lives for one take so the resampler phase and the last
/// input sample carry over frame boundaries.
struct FrameNormalizer {
    target_channels: u16,
    resampler: Resampler,
}

impl FrameNormalizer {
    fn new(target: &AudioBackendConfig) -> Self {
        Self {
            target_channels: target.target_channels,
            resampler: Resampler::new(target.target_sample_rate),
        }
    }

    fn process(&mut self, frame: AudioFrame) -> AudioFrame {
        let mut processed = frame;

        if processed.channels != self.target_channels && self.target_channels == 1 {
            processed = to_mono(processed);
        }

        self.resampler.process(processed)
    }
}

/// Linear-interpolation resampler to an exact output rate
struct Resampler {
    target_rate: u32,
    /// Source rate and channel count the state below belongs to
    format: Option<(u32, u16)>,
    /// Read position of the next output sample, in input sample frames,
    /// counted from `last` when it is set
    position: f64,
    /// Final sample frame of the previous input
    last: Vec<i16>,
}

impl Resampler {
    fn new(target_rate: u32) -> Self {
        Self {
            target_rate: target_rate.max(1),
            format: None,
            position: 0.0,
            last: Vec::new(),
        }
    }

    fn process(&mut self, frame: AudioFrame) -> AudioFrame {
        if frame.sample_rate == self.target_rate || frame.sample_rate == 0 {
            return frame;
        }

        let channels = frame.channels.max(1) as usize;
        if self.format != Some((frame.sample_rate, frame.channels)) {
            self.format = Some((frame.sample_rate, frame.channels));
            self.position = 0.0;
            self.last.clear();
        }

        let step = frame.sample_rate as f64 / self.target_rate as f64;
        let mut input: Vec<&[i16]> = Vec::with_capacity(frame.samples.len() / channels + 1);
        if !self.last.is_empty() {
            input.push(&self.last);
        }
        input.extend(frame.samples.chunks_exact(channels));

        let mut samples = Vec::new();
        if let Some(final_index) = input.len().checked_sub(1) {
            loop {
                let index = self.position.floor() as usize;
                let frac = self.position - index as f64;
                if index > final_index || (index == final_index && frac > 0.0) {
                    break;
                }

                if frac == 0.0 {
                    samples.extend_from_slice(input[index]);
                } else {
                    let (a, b) = (input[index], input[index + 1]);
                    samples.extend(a.iter().zip(b).map(|(&a, &b)| {
                        (a as f64 + (b as f64 - a as f64) * frac).round() as i16
                    }));
                }
                self.position += step;
            }

            self.position -= final_index as f64;
            self.last = input[final_index].to_vec();
        }

        AudioFrame {
            samples,
            sample_rate: self.target_rate,
            ..frame
        }
    }
}

/// Average interleaved channels into one
fn to_mono(frame: AudioFrame) -> AudioFrame {
    let channels = frame.channels as usize;
    if channels <= 1 {
        return frame;
    }

    let samples: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect();

    AudioFrame {
        samples,
        channels: 1,
        ..frame
    }
}
