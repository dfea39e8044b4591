use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::entry::{EntryError, WeeklyInsightRequest};
use crate::insight::{InsightEngine, WeeklyInsightResult};
use crate::metrics::{self as insight_metrics, Metrics};
use crate::prompts::PromptCorpus;
use crate::transcribe::{DynTranscriber, TranscribeError};

pub const ENV_CORS_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InsightEngine>,
    pub prompts: Arc<PromptCorpus>,
    pub transcriber: Option<DynTranscriber>,
}

impl AppState {
    pub fn new(engine: InsightEngine, prompts: PromptCorpus) -> Self {
        Self {
            engine: Arc::new(engine),
            prompts: Arc::new(prompts),
            transcriber: None,
        }
    }

    pub fn with_transcriber(mut self, transcriber: Option<DynTranscriber>) -> Self {
        self.transcriber = transcriber;
        self
    }
}

/// Handler errors rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Invalid(EntryError),
    BadDate(String),
    TranscriptionUnavailable,
    Transcription(TranscribeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Invalid(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::BadDate(d) => (
                StatusCode::BAD_REQUEST,
                format!("invalid date '{d}', expected YYYY-MM-DD"),
            ),
            ApiError::TranscriptionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "transcription is not configured".to_string(),
            ),
            ApiError::Transcription(TranscribeError::EmptyAudio) => {
                (StatusCode::BAD_REQUEST, TranscribeError::EmptyAudio.to_string())
            }
            ApiError::Transcription(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = match std::env::var(ENV_CORS_ORIGINS) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect(),
        Err(_) => DEFAULT_CORS_ORIGINS
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
    };
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/prompt/today", get(prompt_today))
        .route("/prompt/{date}", get(prompt_for_date))
        .route("/insights/weekly", post(insights_weekly))
        .route("/transcribe", post(transcribe))
        .layer(cors_layer())
        .with_state(state)
}

/// Router plus `/metrics` when a recorder is installed.
pub fn router_with_metrics(state: AppState, metrics: Option<&Metrics>) -> Router {
    let app = create_router(state);
    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn prompt_today(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "prompt": state.prompts.prompt_for_today() }))
}

async fn prompt_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let d = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| ApiError::BadDate(date))?;
    Ok(Json(json!({ "prompt": state.prompts.prompt_for_date(d) })))
}

async fn insights_weekly(
    State(state): State<AppState>,
    Json(body): Json<WeeklyInsightRequest>,
) -> Result<Json<WeeklyInsightResult>, ApiError> {
    insight_metrics::insights_request();
    body.validate().map_err(ApiError::Invalid)?;
    let result = state.engine.weekly_insights(&body.entries).await;
    Ok(Json(result))
}

#[derive(Deserialize)]
struct TranscribeQuery {
    language: Option<String>,
}

/// "audio/wav" → "audio.wav"; anything unrecognized is treated as webm.
fn audio_filename(headers: &HeaderMap) -> String {
    let ext = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .and_then(|ct| ct.trim().strip_prefix("audio/"))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("webm");
    format!("audio.{ext}")
}

async fn transcribe(
    State(state): State<AppState>,
    Query(q): Query<TranscribeQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(t) = state.transcriber.as_ref() else {
        return Err(ApiError::TranscriptionUnavailable);
    };
    let filename = audio_filename(&headers);
    let text = t
        .transcribe(body.to_vec(), &filename, q.language.as_deref())
        .await
        .map_err(|e| {
            warn!(error = %e, "transcription failed");
            ApiError::Transcription(e)
        })?;
    Ok(Json(json!({ "text": text })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_follows_audio_content_type() {
        let mut h = HeaderMap::new();
        assert_eq!(audio_filename(&h), "audio.webm");
        h.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav; codecs=1"));
        assert_eq!(audio_filename(&h), "audio.wav");
        h.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(audio_filename(&h), "audio.webm");
    }
}
