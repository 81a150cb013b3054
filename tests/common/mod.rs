// Shared fakes for the translation backend and audio devices
#![allow(dead_code)]

use anyhow::{bail, Result};
use clinic_translate::audio::{AudioBackend, AudioFrame};
use clinic_translate::lifecycle::{ControllerConfig, MessageLifecycleController};
use clinic_translate::message::Role;
use clinic_translate::translation::{
    AudioTranslationRequest, HistoryService, MessageRecord, TextTranslationRequest,
    TranslationService,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// What the fake translation backend was asked
#[derive(Debug, Clone)]
pub struct Call {
    pub text: Option<String>,
    pub audio_bytes: Option<usize>,
    pub mime_type: Option<String>,
    pub role: Role,
    pub target_language: String,
}

/// In-memory translation backend
pub struct FakeTranslator {
    fail: bool,
    with_ids: bool,
    gate: Option<Arc<Semaphore>>,
    translations: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self {
            fail: false,
            with_ids: true,
            gate: None,
            translations: HashMap::new(),
            delays: HashMap::new(),
            next_id: AtomicI64::new(100),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn without_ids(mut self) -> Self {
        self.with_ids = false;
        self
    }

    /// Each call waits for a permit before answering
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_translation(mut self, text: &str, translated: &str) -> Self {
        self.translations.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: Call) -> Result<MessageRecord> {
        self.calls.lock().unwrap().push(call.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        let key = call.text.clone().unwrap_or_default();
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        if self.fail {
            bail!("connection refused");
        }

        let text = call
            .text
            .clone()
            .unwrap_or_else(|| "transcribed speech".to_string());
        let translated = self
            .translations
            .get(&text)
            .cloned()
            .unwrap_or_else(|| format!("{}: {}", call.target_language, text));

        Ok(MessageRecord {
            id: self
                .with_ids
                .then(|| self.next_id.fetch_add(1, Ordering::SeqCst)),
            role: Some(call.role.to_string()),
            text,
            translated_text: Some(translated),
            timestamp: Some("2025-10-27T14:30:05+00:00".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl TranslationService for FakeTranslator {
    async fn translate_text(&self, request: &TextTranslationRequest) -> Result<MessageRecord> {
        self.answer(Call {
            text: Some(request.text.clone()),
            audio_bytes: None,
            mime_type: None,
            role: request.role,
            target_language: request.target_language.clone(),
        })
        .await
    }

    async fn translate_audio(&self, request: AudioTranslationRequest) -> Result<MessageRecord> {
        self.answer(Call {
            text: None,
            audio_bytes: Some(request.artifact.data.len()),
            mime_type: Some(request.artifact.mime_type.clone()),
            role: request.role,
            target_language: request.target_language.clone(),
        })
        .await
    }
}

/// In-memory history backend
pub struct FakeHistory {
    records: Vec<MessageRecord>,
    fail: bool,
    gate: Option<Arc<Semaphore>>,
    pub fetches: AtomicUsize,
    pub cleared: AtomicBool,
}

impl FakeHistory {
    pub fn empty() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<MessageRecord>) -> Self {
        Self {
            records,
            fail: false,
            gate: None,
            fetches: AtomicUsize::new(0),
            cleared: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait::async_trait]
impl HistoryService for FakeHistory {
    async fn fetch_history(&self) -> Result<Vec<MessageRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if self.fail {
            bail!("history unavailable");
        }
        Ok(self.records.clone())
    }

    async fn clear_history(&self) -> Result<()> {
        if self.fail {
            bail!("history unavailable");
        }
        self.cleared.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn summarize(&self) -> Result<String> {
        if self.fail {
            bail!("history unavailable");
        }
        Ok(format!("{} messages discussed", self.records.len()))
    }
}

pub fn history_record(id: i64, role: &str, text: &str, translated: &str) -> MessageRecord {
    MessageRecord {
        id: Some(id),
        role: Some(role.to_string()),
        text: text.to_string(),
        translated_text: Some(translated.to_string()),
        timestamp: Some("2025-10-27T14:00:00+00:00".to_string()),
    }
}

pub fn controller_with(
    translator: Arc<FakeTranslator>,
    history: Arc<FakeHistory>,
) -> MessageLifecycleController {
    MessageLifecycleController::new(translator, history, ControllerConfig::default())
}

/// Audio backend driven by the test through a channel
///
/// Frames pushed into `feed()` reach the capture session; `deny()` makes the
/// next `start` fail the way a refused permission would.
pub struct ScriptedBackend {
    feed: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
    denied: bool,
    capturing: bool,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct BackendHandle {
    feed: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl BackendHandle {
    /// Push a frame as if the device produced it; false when not capturing
    pub async fn push(&self, frame: AudioFrame) -> bool {
        let sender = self.feed.lock().unwrap().clone();
        match sender {
            Some(tx) => tx.send(frame).await.is_ok(),
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.feed.lock().unwrap().is_some()
    }
}

impl ScriptedBackend {
    pub fn new() -> (Self, BackendHandle) {
        let feed = Arc::new(Mutex::new(None));
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));

        let backend = Self {
            feed: Arc::clone(&feed),
            denied: false,
            capturing: false,
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
        };
        let handle = BackendHandle { feed, starts, stops };

        (backend, handle)
    }

    pub fn denied() -> (Self, BackendHandle) {
        let (mut backend, handle) = Self::new();
        backend.denied = true;
        (backend, handle)
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.denied {
            bail!("Permission denied");
        }
        let (tx, rx) = mpsc::channel(64);
        *self.feed.lock().unwrap() = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.feed.lock().unwrap().take();
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl Drop for ScriptedBackend {
    fn drop(&mut self) {
        self.feed.lock().unwrap().take();
    }
}

pub fn pcm_frame(samples: Vec<i16>, timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}
