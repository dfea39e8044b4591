//! AI adapter: the text-generation capability the report synthesizer depends on,
//! plus the concrete providers (Gemini, OpenAI) and a fixed-reply mock.
//!
//! Absence of a collaborator is modelled as "no client" (`Option<DynTextClient>`),
//! never as a client that silently does nothing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ai::AiConfig;

/// Failure of one collaborator call. Always recoverable for the engine.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("missing API key for provider {0}")]
    MissingApiKey(&'static str),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned an empty body")]
    Empty,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// External generative-text collaborator.
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Run one generation with a fixed system instruction and a user payload.
    /// Returns the raw model text (expected to hold one JSON object).
    async fn generate(&self, system_instruction: &str, payload: &str)
        -> Result<String, GenerateError>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynTextClient = Arc<dyn TextGenerationClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns the deterministic mock client.
/// * Else if `config.enabled == false`, returns `None`.
/// * Else builds the configured provider.
pub fn build_client_from_config(config: &AiConfig) -> Option<DynTextClient> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Some(Arc::new(MockClient::canned()));
    }

    if !config.enabled {
        return None;
    }

    match config.provider.as_str() {
        "gemini" => Some(Arc::new(GeminiClient::new(config))),
        "openai" => Some(Arc::new(OpenAiClient::new(config))),
        _ => None,
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("reflection-insights/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

async fn read_error_body(resp: reqwest::Response) -> GenerateError {
    let status = resp.status().as_u16();
    let mut body = resp.text().await.unwrap_or_default();
    body.truncate(300);
    GenerateError::Status { status, body }
}

// ------------------------------------------------------------
// Gemini (Generative Language API)
// ------------------------------------------------------------

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(cfg: &AiConfig) -> Self {
        Self {
            http: http_client(cfg.timeout()),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        }
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiReq<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Deserialize)]
struct GeminiResp {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiRespContent>,
}

#[derive(Deserialize)]
struct GeminiRespContent {
    #[serde(default)]
    parts: Vec<GeminiRespPart>,
}

#[derive(Deserialize)]
struct GeminiRespPart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerationClient for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        payload: &str,
    ) -> Result<String, GenerateError> {
        if self.api_key.is_empty() {
            return Err(GenerateError::MissingApiKey("gemini"));
        }

        let req = GeminiReq {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_instruction,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: payload }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(read_error_body(resp).await);
        }

        let body: GeminiResp = resp.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerateError::Empty);
        }
        Ok(text.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// OpenAI (Chat Completions, JSON mode)
// ------------------------------------------------------------

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl OpenAiClient {
    pub fn new(cfg: &AiConfig) -> Self {
        Self {
            http: http_client(cfg.timeout()),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        }
    }
}

#[async_trait]
impl TextGenerationClient for OpenAiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        payload: &str,
    ) -> Result<String, GenerateError> {
        if self.api_key.is_empty() {
            return Err(GenerateError::MissingApiKey("openai"));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            response_format: ResponseFormat,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system_instruction,
                },
                Msg {
                    role: "user",
                    content: payload,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(read_error_body(resp).await);
        }
        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(GenerateError::Empty);
        }
        Ok(content.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Fixed-reply client for local runs (`AI_TEST_MODE=mock`) and tests.
#[derive(Clone)]
pub struct MockClient {
    pub reply: String,
}

impl MockClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }

    /// A well-formed report, independent of the input.
    pub fn canned() -> Self {
        Self::new(
            r#"{"themes":[{"theme":"routine","percent":60,"details":["morning walks","early nights"]},{"theme":"connection","percent":40,"details":["calls with family","weekend dinner"]}],"polarity":"neutral","repeating_phrases":[],"summary":"This week, you wrote most about your routine and the people around you. (mock)"}"#,
        )
    }
}

#[async_trait]
impl TextGenerationClient for MockClient {
    async fn generate(&self, _system: &str, _payload: &str) -> Result<String, GenerateError> {
        Ok(self.reply.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
