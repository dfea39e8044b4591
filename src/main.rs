//! Reflection Insights: binary entrypoint.
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use reflection_insights::ai_bootstrap::AiRuntime;
use reflection_insights::api::{router_with_metrics, AppState};
use reflection_insights::metrics::Metrics;
use reflection_insights::prompts::PromptCorpus;
use reflection_insights::transcribe::{DynTranscriber, ElevenLabsTranscriber};
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - INSIGHTS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("INSIGHTS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("insight=debug,info"));

    // Shuttle may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    // Missing or malformed corpus is fatal at startup.
    let prompts = PromptCorpus::load_default()?;

    let engine = AiRuntime::from_env().into_engine();
    info!(collaborator = engine.has_collaborator(), "insight engine ready");

    let transcriber = ElevenLabsTranscriber::from_env().map(|t| Arc::new(t) as DynTranscriber);
    info!(enabled = transcriber.is_some(), "transcription");

    let metrics = Metrics::init();
    let state = AppState::new(engine, prompts).with_transcriber(transcriber);
    let router = router_with_metrics(state, metrics.as_ref());

    Ok(router.into())
}
