// src/transcribe.rs
//! Speech-to-text passthrough (ElevenLabs Scribe). No logic of its own: audio in,
//! plain text out, or an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

const ELEVENLABS_STT_URL: &str = "https://api.elevenlabs.io/v1/speech-to-text";
const SCRIBE_MODEL: &str = "scribe_v2";

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("audio body is empty")]
    EmptyAudio,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcription service returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `language`: e.g. "eng"; `None` lets the service auto-detect.
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        language: Option<&str>,
    ) -> Result<String, TranscribeError>;
}

pub type DynTranscriber = Arc<dyn Transcriber>;

pub struct ElevenLabsTranscriber {
    http: reqwest::Client,
    api_key: String,
}

impl ElevenLabsTranscriber {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    /// `None` when `ELEVENLABS_API_KEY` is unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
    }
}

#[derive(Deserialize)]
struct SttResp {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Transcriber for ElevenLabsTranscriber {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        language: Option<&str>,
    ) -> Result<String, TranscribeError> {
        if audio.is_empty() {
            return Err(TranscribeError::EmptyAudio);
        }

        let mut form = Form::new()
            .part("file", Part::bytes(audio).file_name(filename.to_string()))
            .text("model_id", SCRIBE_MODEL)
            .text("diarize", "false")
            .text("tag_audio_events", "false");
        if let Some(lang) = language.filter(|l| !l.trim().is_empty()) {
            form = form.text("language_code", lang.trim().to_string());
        }

        let resp = self
            .http
            .post(ELEVENLABS_STT_URL)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(TranscribeError::Status(resp.status().as_u16()));
        }
        let body: SttResp = resp.json().await?;
        Ok(body.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_audio_is_rejected_locally() {
        let t = ElevenLabsTranscriber::new("k");
        let err = t.transcribe(Vec::new(), "a.webm", None).await.unwrap_err();
        assert!(matches!(err, TranscribeError::EmptyAudio));
    }
}
