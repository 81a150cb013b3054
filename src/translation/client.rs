use anyhow::{bail, Context, Result};
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{
    AudioTranslationRequest, ErrorResponse, MessageRecord, SummaryResponse, TextTranslationRequest,
};
use super::service::{HistoryService, TranslationService};

/// HTTP client for the translation backend (`/translate`, `/history`, `/summary`)
pub struct HttpTranslationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranslationClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!("Translation backend at {}", base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a JSON body, turning non-2xx statuses into errors
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        bail!("status {}: {}", status, detail);
    }

    response
        .json::<T>()
        .await
        .context("Failed to decode response body")
}

#[async_trait::async_trait]
impl TranslationService for HttpTranslationClient {
    async fn translate_text(&self, request: &TextTranslationRequest) -> Result<MessageRecord> {
        debug!(
            "POST /translate (text, {} chars, role={}, target={})",
            request.text.chars().count(),
            request.role,
            request.target_language
        );

        let response = self
            .client
            .post(self.url("/translate"))
            .json(request)
            .send()
            .await
            .context("Translation request failed")?;

        read_json(response).await
    }

    async fn translate_audio(&self, request: AudioTranslationRequest) -> Result<MessageRecord> {
        let AudioTranslationRequest {
            artifact,
            role,
            target_language,
        } = request;

        debug!(
            "POST /translate (audio, {} bytes, role={}, target={})",
            artifact.data.len(),
            role,
            target_language
        );

        let audio_part = multipart::Part::bytes(artifact.data)
            .file_name(artifact.file_name)
            .mime_str(&artifact.mime_type)
            .context("Invalid audio MIME type")?;

        let form = multipart::Form::new()
            .part("audio", audio_part)
            .text("role", role.as_str())
            .text("targetLanguage", target_language);

        let response = self
            .client
            .post(self.url("/translate"))
            .multipart(form)
            .send()
            .await
            .context("Audio translation request failed")?;

        read_json(response).await
    }
}

#[async_trait::async_trait]
impl HistoryService for HttpTranslationClient {
    async fn fetch_history(&self) -> Result<Vec<MessageRecord>> {
        let response = self
            .client
            .get(self.url("/history"))
            .send()
            .await
            .context("History request failed")?;

        read_json(response).await
    }

    async fn clear_history(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/history"))
            .send()
            .await
            .context("Clear history request failed")?;

        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }

    async fn summarize(&self) -> Result<String> {
        let response = self
            .client
            .post(self.url("/summary"))
            .send()
            .await
            .context("Summary request failed")?;

        let summary: SummaryResponse = read_json(response).await?;
        Ok(summary.summary)
    }
}
