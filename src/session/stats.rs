use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::message::{Language, Role};

/// Snapshot of a conversation session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// When the session was opened
    pub started_at: DateTime<Utc>,

    /// Seconds since the session was opened
    pub duration_secs: f64,

    /// Whether a recording is in progress
    pub is_recording: bool,

    pub role: Role,

    pub language: Language,

    /// Messages currently in the store
    pub visible_messages: usize,

    /// Expiry timers that have not fired yet
    pub pending_expiries: usize,

    pub sends_issued: usize,
    pub sends_completed: usize,
    pub sends_failed: usize,
}
