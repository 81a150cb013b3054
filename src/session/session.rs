use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::{ArtifactConsumer, AudioArtifact, AudioBackend, AudioCaptureSession};
use crate::lifecycle::{ChatError, Delivery, MessageLifecycleController};
use crate::message::{Language, LanguageCatalog, Message, Role};
use crate::translation::{HistoryService, TranslationService};

/// User intents coming from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    SubmitText(String),
    StartRecording,
    StopRecording,
    SelectLanguage(String),
    SelectRole(Role),
    ClearHistory,
    RequestSummary,
}

/// What handling an event did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Sent(Delivery),
    RecordingStarted,
    RecordingStopped { artifact: bool },
    LanguageSelected { language: Language },
    RoleSelected { role: Role },
    HistoryCleared,
    Summary { summary: String },
}

/// Who is speaking and into which language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub role: Role,
    pub language: Language,
}

/// One conversation: controller, recorder and the current selection
///
/// Finished recordings are sent with the role and language selected at the
/// moment recording stops.
pub struct ChatSession {
    controller: MessageLifecycleController,
    capture: Mutex<AudioCaptureSession>,
    selection: Arc<RwLock<Selection>>,
    catalog: LanguageCatalog,
    started_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(
        translator: Arc<dyn TranslationService>,
        history: Arc<dyn HistoryService>,
        backend: Box<dyn AudioBackend>,
        config: SessionConfig,
    ) -> Self {
        let controller =
            MessageLifecycleController::new(translator, history, config.controller.clone());

        let selection = Arc::new(RwLock::new(Selection {
            role: config.default_role,
            language: config.default_language.clone(),
        }));

        let consumer = audio_consumer(controller.clone(), Arc::clone(&selection));
        let capture = AudioCaptureSession::new(backend, config.audio.clone(), consumer);

        info!(
            "Chat session opened (role={}, language={})",
            config.default_role, config.default_language
        );

        Self {
            controller,
            capture: Mutex::new(capture),
            selection,
            catalog: config.catalog,
            started_at: Utc::now(),
        }
    }

    pub fn controller(&self) -> &MessageLifecycleController {
        &self.controller
    }

    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> Selection {
        self.selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current ordered message list
    pub fn messages(&self) -> Vec<Message> {
        self.controller.store().snapshot()
    }

    /// Message list, re-emitted on every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.controller.store().subscribe()
    }

    /// Load persisted history; failures are logged and ignored
    pub async fn hydrate(&self) {
        match self.controller.hydrate_history().await {
            Ok(count) => info!("Session hydrated with {} history messages", count),
            Err(e) => warn!("Could not load history: {}", e),
        }
    }

    pub async fn handle(&self, event: PresentationEvent) -> Result<EventOutcome, ChatError> {
        match event {
            PresentationEvent::SubmitText(text) => {
                let Selection { role, language } = self.selection();
                let delivery = self.controller.send_text(&text, role, &language).await?;
                Ok(EventOutcome::Sent(delivery))
            }

            PresentationEvent::StartRecording => {
                self.capture.lock().await.start().await?;
                Ok(EventOutcome::RecordingStarted)
            }

            PresentationEvent::StopRecording => {
                let artifact = self.capture.lock().await.stop().await?;
                Ok(EventOutcome::RecordingStopped { artifact })
            }

            PresentationEvent::SelectLanguage(name) => {
                let language = self
                    .catalog
                    .resolve(&name)
                    .ok_or(ChatError::UnsupportedLanguage(name))?;
                self.update_selection(|s| s.language = language.clone());
                info!("Target language set to {}", language);
                Ok(EventOutcome::LanguageSelected { language })
            }

            PresentationEvent::SelectRole(role) => {
                self.update_selection(|s| s.role = role);
                info!("Speaking role set to {}", role);
                Ok(EventOutcome::RoleSelected { role })
            }

            PresentationEvent::ClearHistory => {
                self.controller.clear_history().await?;
                Ok(EventOutcome::HistoryCleared)
            }

            PresentationEvent::RequestSummary => {
                let summary = self.controller.summarize().await?;
                Ok(EventOutcome::Summary { summary })
            }
        }
    }

    pub async fn is_recording(&self) -> bool {
        self.capture.lock().await.is_recording()
    }

    pub async fn stats(&self) -> SessionStats {
        let Selection { role, language } = self.selection();
        let counts = self.controller.counts();
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            is_recording: self.is_recording().await,
            role,
            language,
            visible_messages: self.controller.store().len(),
            pending_expiries: self.controller.expiry().pending(),
            sends_issued: counts.issued,
            sends_completed: counts.completed,
            sends_failed: counts.failed,
        }
    }

    /// Abort pending expiry timers
    pub fn shutdown(&self) {
        self.controller.expiry().shutdown();
        info!("Chat session closed");
    }

    fn update_selection(&self, apply: impl FnOnce(&mut Selection)) {
        let mut selection = self.selection.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut selection);
    }
}

/// Send each finished recording in the background
fn audio_consumer(
    controller: MessageLifecycleController,
    selection: Arc<RwLock<Selection>>,
) -> ArtifactConsumer {
    Arc::new(move |artifact: AudioArtifact| {
        let Selection { role, language } = selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let controller = controller.clone();

        tokio::spawn(async move {
            controller.send_audio(artifact, role, &language).await;
        });
    })
}
