//! Client side of the translation backend
//!
//! - `TranslationService`: text and audio translation
//! - `HistoryService`: persisted history, clearing it, summarizing it
//! - `HttpTranslationClient`: reqwest implementation of both

pub mod client;
pub mod messages;
pub mod service;

pub use client::HttpTranslationClient;
pub use messages::{
    AudioTranslationRequest, MessageRecord, SummaryResponse, TextTranslationRequest,
};
pub use service::{HistoryService, TranslationService};
