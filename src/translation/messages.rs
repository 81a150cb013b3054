use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::AudioArtifact;
use crate::message::{Message, MessageId, MessageKind, MessageStatus, Role};

/// JSON body for a typed-text translation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTranslationRequest {
    pub text: String,
    pub role: Role,
    pub target_language: String,
}

/// Multipart payload for a recorded clip
#[derive(Debug, Clone)]
pub struct AudioTranslationRequest {
    pub artifact: AudioArtifact,
    pub role: Role,
    pub target_language: String,
}

/// Message record as returned by `/translate` and listed by `/history`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub translated_text: Option<String>,

    /// ISO-8601, with or without an offset
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Response of `/summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Error body the backend sends with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl MessageRecord {
    /// Turn a translation response into the record that replaces `placeholder`
    ///
    /// The result always carries the placeholder's id so the store can locate
    /// it; the server's own id is kept as `remote_id`.
    pub fn into_reconciled(self, placeholder: &Message) -> Message {
        if self.id.is_none() {
            debug!("Response for {} carried no id, keeping local id", placeholder.id);
        }

        let role = self
            .role
            .as_deref()
            .and_then(|r| r.parse().ok())
            .unwrap_or(placeholder.role);

        let text = if self.text.is_empty() {
            placeholder.text.clone()
        } else {
            self.text
        };

        Message {
            id: placeholder.id,
            remote_id: self.id,
            role,
            kind: placeholder.kind,
            text,
            translated_text: Some(self.translated_text.unwrap_or_default()),
            timestamp: self
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(placeholder.timestamp),
            status: MessageStatus::Complete,
        }
    }

    /// Turn a persisted history row into a completed message
    pub fn into_history_message(self) -> Message {
        let id = match self.id {
            Some(remote) => MessageId::Remote(remote),
            None => MessageId::new(),
        };

        let role = match self.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            other => {
                warn!("History entry {} has unknown role {:?}, showing as Doctor", id, other);
                Role::Doctor
            }
        };

        Message {
            id,
            remote_id: self.id,
            role,
            kind: MessageKind::Text,
            text: self.text,
            translated_text: self.translated_text,
            timestamp: self
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            status: MessageStatus::Complete,
        }
    }
}

/// Parse RFC 3339, falling back to a naive timestamp read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .ok()
}
