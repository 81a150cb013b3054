// Integration tests for audio backends and WAV handling
//
// WAV fixtures are generated into a temp dir with hound.

use anyhow::Result;
use clinic_translate::audio::{
    AudioArtifact, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame,
    AudioSource, FileBackend,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 2000) as i16 - 1000).collect()
}

#[test]
fn test_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz speech");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_audio_source_parsing() {
    assert_eq!("microphone".parse::<AudioSource>().unwrap(), AudioSource::Microphone);
    assert_eq!(" Microphone ".parse::<AudioSource>().unwrap(), AudioSource::Microphone);
    assert_eq!(
        "file:/tmp/take.wav".parse::<AudioSource>().unwrap(),
        AudioSource::File(PathBuf::from("/tmp/take.wav"))
    );

    assert!("file:".parse::<AudioSource>().is_err());
    assert!("speaker".parse::<AudioSource>().is_err());
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "consult.wav", 16000, 1, &ramp(8000));

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 8000);
    assert!((audio.duration_seconds - 0.5).abs() < 1e-9);
    assert!(audio.path.contains("consult.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let result = AudioFile::open("/nonexistent/path/to/audio.wav");
    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_frames_cover_every_sample() -> Result<()> {
    let dir = TempDir::new()?;
    // 250ms of stereo: two full 100ms frames and a 50ms tail
    let samples = ramp(16000 / 4 * 2);
    let path = write_wav(dir.path(), "stereo.wav", 16000, 2, &samples);

    let frames = AudioFile::open(&path)?.frames(100);

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].samples.len(), 1600 * 2);
    assert_eq!(frames[2].samples.len(), 800 * 2);
    assert_eq!(frames[1].timestamp_ms, 100);
    assert!(frames.iter().all(|f| f.channels == 2 && f.sample_rate == 16000));

    let joined: Vec<i16> = frames.into_iter().flat_map(|f| f.samples).collect();
    assert_eq!(joined, samples);

    Ok(())
}

#[tokio::test]
async fn test_file_backend_replays_then_ends() -> Result<()> {
    let dir = TempDir::new()?;
    let samples = ramp(4000);
    let path = write_wav(dir.path(), "replay.wav", 16000, 1, &samples);

    let mut backend = FileBackend::new(&path, AudioBackendConfig::default()).unpaced();
    assert!(!backend.is_capturing());

    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());
    assert!(backend.start().await.is_err(), "second start must fail");

    let mut received = Vec::new();
    while let Some(frame) = rx.recv().await {
        received.extend(frame.samples);
    }
    assert_eq!(received, samples);

    backend.stop().await?;
    assert!(!backend.is_capturing());

    Ok(())
}

#[tokio::test]
async fn test_file_backend_missing_file_fails_start() {
    let mut backend = FileBackend::new("/nonexistent/take.wav", AudioBackendConfig::default());
    assert!(backend.start().await.is_err());
    assert!(!backend.is_capturing());
}

#[tokio::test]
async fn test_dropping_file_backend_ends_replay() -> Result<()> {
    let dir = TempDir::new()?;
    // 2 seconds of paced replay, 20 frames
    let path = write_wav(dir.path(), "long.wav", 16000, 1, &ramp(32000));

    let mut backend = FileBackend::new(&path, AudioBackendConfig::default());
    let mut rx = backend.start().await?;
    assert!(rx.recv().await.is_some());

    drop(backend);

    let remaining = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        count
    })
    .await
    .expect("replay kept running after the backend was dropped");
    assert!(remaining < 3, "got {} more frames", remaining);

    Ok(())
}

#[cfg(not(feature = "microphone"))]
#[tokio::test]
async fn test_microphone_unavailable_without_feature() -> Result<()> {
    let mut backend =
        AudioBackendFactory::create(AudioSource::Microphone, AudioBackendConfig::default())?;

    assert_eq!(backend.name(), "unavailable");
    assert!(backend.start().await.is_err());
    assert!(!backend.is_capturing());

    Ok(())
}

#[test]
fn test_factory_builds_file_backend() -> Result<()> {
    let backend = AudioBackendFactory::create(
        AudioSource::File(PathBuf::from("take.wav")),
        AudioBackendConfig::default(),
    )?;
    assert_eq!(backend.name(), "WAV file");
    Ok(())
}

#[test]
fn test_encode_wav_round_trips_through_hound() -> Result<()> {
    let frames = vec![
        AudioFrame {
            samples: vec![1, 2, 3, 4],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 0,
        },
        AudioFrame {
            samples: vec![-5, -6],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 100,
        },
    ];

    let artifact = AudioArtifact::encode_wav(&frames, 16000, 1)?;
    assert_eq!(artifact.mime_type, "audio/wav");
    assert_eq!(artifact.file_name, "recording.wav");

    let reader = hound::WavReader::new(Cursor::new(artifact.data))?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    let decoded: Vec<i16> = reader.into_samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(decoded, vec![1, 2, 3, 4, -5, -6]);

    Ok(())
}

#[test]
fn test_encode_wav_duration() -> Result<()> {
    let frames = vec![AudioFrame {
        samples: vec![0; 32000],
        sample_rate: 16000,
        channels: 2,
        timestamp_ms: 0,
    }];

    let artifact = AudioArtifact::encode_wav(&frames, 16000, 2)?;
    assert_eq!(artifact.duration_ms, 1000);

    let empty = AudioArtifact::encode_wav(&[], 16000, 1)?;
    assert_eq!(empty.duration_ms, 0);
    assert!(!empty.data.is_empty(), "header is still written");

    Ok(())
}
