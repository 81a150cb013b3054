use anyhow::{anyhow, Context, Result};
use std::time::Duration;

use crate::audio::{AudioBackendConfig, AudioSource};
use crate::config::Config;
use crate::lifecycle::ControllerConfig;
use crate::message::{Language, LanguageCatalog, Role};

/// Configuration for a conversation session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// TTL and request timeout for the send flow
    pub controller: ControllerConfig,

    /// Languages the user may pick from
    pub catalog: LanguageCatalog,

    /// Speaker selected when the session opens
    pub default_role: Role,

    /// Target language selected when the session opens
    pub default_language: Language,

    /// Where recordings come from
    pub audio_source: AudioSource,

    /// Format recordings are normalized to before upload
    pub audio: AudioBackendConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let catalog = LanguageCatalog::default();
        let default_language = catalog.languages()[0].clone();

        Self {
            controller: ControllerConfig::default(),
            catalog,
            default_role: Role::Doctor,
            default_language,
            audio_source: AudioSource::Microphone,
            audio: AudioBackendConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let conversation = &cfg.conversation;

        let catalog = LanguageCatalog::new(conversation.languages.iter().cloned());
        let default_language = catalog.resolve(&conversation.default_language).ok_or_else(|| {
            anyhow!(
                "Default language {:?} is not in the configured languages",
                conversation.default_language
            )
        })?;

        let default_role = conversation
            .default_role
            .parse::<Role>()
            .map_err(|e| anyhow!(e))?;

        let audio_source = cfg
            .audio
            .source
            .parse::<AudioSource>()
            .context("Invalid audio.source")?;

        Ok(Self {
            controller: ControllerConfig {
                message_ttl: Duration::from_secs(conversation.message_ttl_secs),
                request_timeout: Duration::from_secs(cfg.translation.request_timeout_secs),
            },
            catalog,
            default_role,
            default_language,
            audio_source,
            audio: AudioBackendConfig {
                target_sample_rate: cfg.audio.sample_rate,
                target_channels: cfg.audio.channels,
                buffer_duration_ms: cfg.audio.buffer_duration_ms,
            },
        })
    }
}
