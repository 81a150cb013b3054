/// Failures surfaced by the conversation core
///
/// Only `TransportFailure` ever reaches a visible message (as an error
/// status on the placeholder); callers log and absorb the rest.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message text is empty")]
    EmptyInput,

    #[error("audio capture denied: {0:#}")]
    CaptureDenied(anyhow::Error),

    #[error("recording could not be finalized: {0:#}")]
    RecordingFailed(anyhow::Error),

    #[error("translation service request failed: {0:#}")]
    TransportFailure(anyhow::Error),

    #[error("unsupported target language: {0}")]
    UnsupportedLanguage(String),
}
