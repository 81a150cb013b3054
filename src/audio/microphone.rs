// Microphone backend using cpal's default input device
//
// cpal streams are not Send, so each capture owns a dedicated thread that
// builds the stream, keeps it alive until stop is requested, then drops it
// (which releases the device).

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.worker.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(256);
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<Result<(u32, u16)>>(1);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop_flag);

        let worker = std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || {
                let stream = match open_input_stream(tx, Arc::clone(&worker_stop)) {
                    Ok((stream, rate, channels)) => {
                        let _ = ready_tx.send(Ok((rate, channels)));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while !worker_stop.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(20));
                }

                drop(stream);
            })
            .context("Failed to spawn capture thread")?;

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Capture startup panicked")?
            .map_err(|_| anyhow!("Capture thread exited before opening the device"))?;

        let (rate, channels) = match ready {
            Ok(format) => format,
            Err(e) => {
                let _ = worker.join();
                return Err(e);
            }
        };

        info!(
            "Microphone capture started ({}Hz, {} channels, target {}Hz/{}ch)",
            rate, channels, self.config.target_sample_rate, self.config.target_channels
        );

        self.stop_flag = stop_flag;
        self.worker = Some(worker);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        self.stop_flag.store(true, Ordering::SeqCst);
        tokio::task::spawn_blocking(move || worker.join())
            .await
            .context("Failed to join capture thread")?
            .map_err(|_| anyhow!("Capture thread panicked"))?;

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

impl Drop for MicrophoneBackend {
    fn drop(&mut self) {
        // The worker drops the stream, and with it the device, once it sees the flag
        if self.worker.take().is_some() {
            self.stop_flag.store(true, Ordering::SeqCst);
            debug!("Microphone backend dropped while capturing");
        }
    }
}

fn open_input_stream(
    tx: mpsc::Sender<AudioFrame>,
    stop_flag: Arc<AtomicBool>,
) -> Result<(cpal::Stream, u32, u16)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    let supported = device
        .default_input_config()
        .context("Failed to query input config")?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    let stream_config: cpal::StreamConfig = supported.config();

    let err_fn = |e: cpal::StreamError| error!("Microphone stream error: {}", e);
    let mut emitted: u64 = 0;

    let mut emit = move |samples: Vec<i16>| {
        let timestamp_ms = emitted * 1000 / (sample_rate as u64 * channels as u64).max(1);
        emitted += samples.len() as u64;
        let frame = AudioFrame {
            samples,
            sample_rate,
            channels,
            timestamp_ms,
        };
        match tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Dropping microphone frame, consumer is behind"),
            Err(TrySendError::Closed(_)) => {
                // Nobody is recording any more; have the worker release the device
                if !stop_flag.swap(true, Ordering::SeqCst) {
                    debug!("Microphone consumer went away, ending capture");
                }
            }
        }
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                emit(
                    data.iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect(),
                )
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| emit(data.to_vec()),
            err_fn,
            None,
        ),
        other => bail!("Unsupported sample format: {:?}", other),
    }
    .context("Failed to build input stream")?;

    stream.play().context("Failed to start input stream")?;

    Ok((stream, sample_rate, channels))
}
