use anyhow::Result;

use super::messages::{AudioTranslationRequest, MessageRecord, TextTranslationRequest};

/// Remote collaborator that translates text and transcribes-then-translates audio
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate_text(&self, request: &TextTranslationRequest) -> Result<MessageRecord>;

    async fn translate_audio(&self, request: AudioTranslationRequest) -> Result<MessageRecord>;
}

/// Remote store of previously translated messages
#[async_trait::async_trait]
pub trait HistoryService: Send + Sync {
    /// Persisted messages, oldest first
    async fn fetch_history(&self) -> Result<Vec<MessageRecord>>;

    /// Delete every persisted message
    async fn clear_history(&self) -> Result<()>;

    /// Clinical summary of the persisted conversation
    async fn summarize(&self) -> Result<String>;
}
