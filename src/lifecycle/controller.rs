use anyhow::anyhow;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::ChatError;
use super::expiry::ExpiryScheduler;
use crate::audio::AudioArtifact;
use crate::message::{Language, Message, MessageId, MessageStatus, MessageStore, Role};
use crate::translation::{
    AudioTranslationRequest, HistoryService, MessageRecord, TextTranslationRequest,
    TranslationService,
};

/// Timing knobs for the send flow
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long any message stays visible, counted from its creation
    pub message_ttl: Duration,

    /// Upper bound on a single translation / history call
    pub request_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            message_ttl: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one send: which entry it created and how it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub id: MessageId,
    pub status: MessageStatus,
}

/// Running totals of sends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendCounts {
    pub issued: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct SendCounters {
    issued: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Drives every outgoing message from placeholder to resolution
///
/// Each send inserts a pending placeholder, arms its expiry, calls the
/// translation service and reconciles the answer into the same slot. Sends
/// are independent: any number may be in flight and they resolve in
/// whatever order the service answers. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct MessageLifecycleController {
    store: Arc<MessageStore>,
    expiry: Arc<ExpiryScheduler>,
    translator: Arc<dyn TranslationService>,
    history: Arc<dyn HistoryService>,
    request_timeout: Duration,
    hydrated: Arc<AtomicBool>,
    counters: Arc<SendCounters>,
}

impl MessageLifecycleController {
    pub fn new(
        translator: Arc<dyn TranslationService>,
        history: Arc<dyn HistoryService>,
        config: ControllerConfig,
    ) -> Self {
        let store = Arc::new(MessageStore::new());
        let expiry = Arc::new(ExpiryScheduler::new(&store, config.message_ttl));

        info!(
            "Lifecycle controller ready (ttl={:?}, timeout={:?})",
            config.message_ttl, config.request_timeout
        );

        Self {
            store,
            expiry,
            translator,
            history,
            request_timeout: config.request_timeout,
            hydrated: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(SendCounters::default()),
        }
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn expiry(&self) -> &ExpiryScheduler {
        &self.expiry
    }

    pub fn counts(&self) -> SendCounts {
        SendCounts {
            issued: self.counters.issued.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }

    /// Send typed text for translation
    pub async fn send_text(
        &self,
        text: &str,
        role: Role,
        language: &Language,
    ) -> Result<Delivery, ChatError> {
        if text.trim().is_empty() {
            debug!("Ignoring blank text submission");
            return Err(ChatError::EmptyInput);
        }

        let placeholder = Message::pending_text(role, text);
        self.track(&placeholder);

        let request = TextTranslationRequest {
            text: text.to_string(),
            role,
            target_language: language.to_string(),
        };

        let result = self
            .bounded(self.translator.translate_text(&request))
            .await;

        Ok(self.reconcile(&placeholder, result))
    }

    /// Send a finished recording for transcription and translation
    pub async fn send_audio(
        &self,
        artifact: AudioArtifact,
        role: Role,
        language: &Language,
    ) -> Delivery {
        let placeholder = Message::pending_audio(role);
        self.track(&placeholder);

        let request = AudioTranslationRequest {
            artifact,
            role,
            target_language: language.to_string(),
        };

        let result = self
            .bounded(self.translator.translate_audio(request))
            .await;

        self.reconcile(&placeholder, result)
    }

    /// Load persisted history into the store, once per session
    ///
    /// An empty history leaves the store alone so messages sent before the
    /// answer arrived survive. Returns how many messages were loaded.
    pub async fn hydrate_history(&self) -> Result<usize, ChatError> {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            warn!("History already hydrated for this session");
            return Ok(0);
        }

        let records = match self.bounded(self.history.fetch_history()).await {
            Ok(records) => records,
            Err(e) => {
                self.hydrated.store(false, Ordering::SeqCst);
                return Err(ChatError::TransportFailure(e));
            }
        };

        if records.is_empty() {
            info!(
                "History empty, keeping {} local messages",
                self.store.len()
            );
            return Ok(0);
        }

        let messages: Vec<Message> = records
            .into_iter()
            .map(MessageRecord::into_history_message)
            .collect();
        let count = messages.len();

        self.store.replace_all(messages);
        info!("Hydrated {} messages from history", count);

        Ok(count)
    }

    /// Wipe the remote history; visible messages are left to expire
    pub async fn clear_history(&self) -> Result<(), ChatError> {
        self.bounded(self.history.clear_history())
            .await
            .map_err(ChatError::TransportFailure)?;
        info!("Remote history cleared");
        Ok(())
    }

    pub async fn summarize(&self) -> Result<String, ChatError> {
        self.bounded(self.history.summarize())
            .await
            .map_err(ChatError::TransportFailure)
    }

    fn track(&self, placeholder: &Message) {
        self.store.insert(placeholder.clone());
        self.expiry.schedule(placeholder.id);
        self.counters.issued.fetch_add(1, Ordering::SeqCst);

        info!(
            "Placeholder {} inserted ({:?}, role={})",
            placeholder.id, placeholder.kind, placeholder.role
        );
    }

    async fn bounded<T>(&self, call: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("timed out after {:?}", self.request_timeout)),
        }
    }

    fn reconcile(&self, placeholder: &Message, result: anyhow::Result<MessageRecord>) -> Delivery {
        let (resolved, status) = match result {
            Ok(record) => {
                self.counters.completed.fetch_add(1, Ordering::SeqCst);
                (record.into_reconciled(placeholder), MessageStatus::Complete)
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!("Translation failed for {}: {:#}", placeholder.id, e);
                (placeholder.failed(), MessageStatus::Error)
            }
        };

        if self.store.replace_by_id(&placeholder.id, resolved) {
            info!("Message {} resolved: {:?}", placeholder.id, status);
        } else {
            info!(
                "Message {} resolved as {:?} after it expired, dropping result",
                placeholder.id, status
            );
        }

        Delivery {
            id: placeholder.id,
            status,
        }
    }
}
