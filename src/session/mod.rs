//! Conversation session management
//!
//! This module provides the `ChatSession` abstraction that ties together:
//! - The message lifecycle controller (sends, reconciliation, expiry)
//! - The audio capture session feeding recorded clips into it
//! - The current speaker role and target language
//! - Session statistics

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::{ChatSession, EventOutcome, PresentationEvent, Selection};
pub use stats::SessionStats;
