use anyhow::{Context, Result};
use std::io::Cursor;

use super::backend::AudioFrame;

/// A finalized recording, ready to upload
///
/// Consumed exactly once by the send flow and then dropped.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Encoded container bytes
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u64,
}

impl AudioArtifact {
    pub const MIME_TYPE: &'static str = "audio/wav";
    pub const FILE_NAME: &'static str = "recording.wav";

    /// Encode buffered frames as a 16-bit PCM WAV file
    ///
    /// All frames must share one format; `sample_rate` / `channels` describe
    /// it and are used as-is when there are no frames at all.
    pub fn encode_wav(frames: &[AudioFrame], sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0usize;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;

            for frame in frames {
                for &sample in &frame.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
                sample_count += frame.samples.len();
            }

            writer.finalize().context("Failed to finalize WAV")?;
        }

        let duration_ms =
            sample_count as u64 * 1000 / (sample_rate as u64 * channels.max(1) as u64).max(1);

        Ok(Self {
            data: cursor.into_inner(),
            mime_type: Self::MIME_TYPE.to_string(),
            file_name: Self::FILE_NAME.to_string(),
            sample_rate,
            channels,
            duration_ms,
        })
    }
}
