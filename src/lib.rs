pub mod audio;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod session;
pub mod terminal;
pub mod translation;

pub use audio::{
    AudioArtifact, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioCaptureSession,
    AudioFile, AudioFrame, AudioSource, CaptureState, FileBackend,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use lifecycle::{ChatError, ControllerConfig, Delivery, ExpiryScheduler, MessageLifecycleController};
pub use message::{Language, LanguageCatalog, Message, MessageId, MessageStatus, MessageStore, Role};
pub use session::{ChatSession, EventOutcome, PresentationEvent, SessionConfig, SessionStats};
pub use translation::{HistoryService, HttpTranslationClient, MessageRecord, TranslationService};
