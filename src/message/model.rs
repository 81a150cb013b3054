use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Label shown as the original text of an audio message until its transcript arrives
pub const AUDIO_PLACEHOLDER_TEXT: &str = "Audio message...";

/// Identifier of a message held in the store
///
/// Locally created messages get a fresh UUID; messages loaded from history
/// keep the integer id the server assigned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", content = "value", rename_all = "snake_case")]
pub enum MessageId {
    Local(Uuid),
    Remote(i64),
}

impl MessageId {
    pub fn new() -> Self {
        MessageId::Local(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Local(uuid) => write!(f, "local-{}", uuid),
            MessageId::Remote(id) => write!(f, "remote-{}", id),
        }
    }
}

/// Conversational party a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which user intent produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Audio,
}

/// Where a message stands in the send flow
///
/// `Complete` and `Error` are terminal; expiry removal is the only thing
/// that happens to a message afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Complete,
    Error,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MessageStatus::Pending)
    }
}

/// A single conversation entry as shown to both parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// Identifier issued by the translation backend, once reconciled
    pub remote_id: Option<i64>,

    pub role: Role,

    pub kind: MessageKind,

    /// Original content (or the audio placeholder label)
    pub text: String,

    /// Translation, present once the message is complete
    pub translated_text: Option<String>,

    pub timestamp: DateTime<Utc>,

    pub status: MessageStatus,
}

impl Message {
    /// Optimistic placeholder for typed text
    pub fn pending_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            remote_id: None,
            role,
            kind: MessageKind::Text,
            text: text.into(),
            translated_text: None,
            timestamp: Utc::now(),
            status: MessageStatus::Pending,
        }
    }

    /// Optimistic placeholder for a recorded audio clip
    pub fn pending_audio(role: Role) -> Self {
        Self {
            kind: MessageKind::Audio,
            ..Self::pending_text(role, AUDIO_PLACEHOLDER_TEXT)
        }
    }

    /// The same placeholder, marked as failed. Original text is kept.
    pub fn failed(&self) -> Self {
        Self {
            translated_text: None,
            status: MessageStatus::Error,
            ..self.clone()
        }
    }

    /// Human-readable translation column, derived from status and kind
    pub fn translation_label(&self) -> &str {
        match (self.status, self.kind) {
            (MessageStatus::Pending, MessageKind::Text) => "Translating...",
            (MessageStatus::Pending, MessageKind::Audio) => "Transcribing...",
            (MessageStatus::Complete, _) => self.translated_text.as_deref().unwrap_or(""),
            (MessageStatus::Error, MessageKind::Text) => "Error sending message",
            (MessageStatus::Error, MessageKind::Audio) => "Error sending audio",
        }
    }
}
