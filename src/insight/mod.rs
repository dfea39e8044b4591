// src/insight/mod.rs
//! Insight engine: entries → signals → (collaborator | local fallback) → repaired result.
//!
//! The engine never fails a request because of the collaborator. Any error while
//! calling it or validating its reply is recorded in `collaborator_error` and
//! the local fallback report is used instead.

pub mod ai_adapter;
pub mod details;
pub mod lexicon;
pub mod normalize;
pub mod phrases;
pub mod schema;
pub mod signals;
pub mod synth;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entry::Entry;
use crate::metrics as insight_metrics;

pub use ai_adapter::{DynTextClient, GenerateError, TextGenerationClient};
pub use lexicon::Polarity;
pub use normalize::ThemeObject;
pub use schema::{DraftReport, ValidationError};
pub use signals::SignalBundle;

pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(20);

/// Response body of `/insights/weekly`. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyInsightResult {
    pub themes: Vec<ThemeObject>,
    pub summary: String,
    pub polarity: Polarity,
    pub repeating_phrases: Vec<String>,
    /// Legacy top-token list (not ranked by percent).
    pub themes_plain: Vec<String>,
    /// Legacy multi-line plain-text rendering.
    pub report: String,
    pub used_collaborator: bool,
    pub collaborator_error: Option<String>,
}

/// Why a collaborator attempt was discarded.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Contract(#[from] ValidationError),
}

pub struct InsightEngine {
    client: Option<DynTextClient>,
    timeout: Duration,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::local_only()
    }
}

impl InsightEngine {
    pub fn new(client: Option<DynTextClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// No collaborator: every report is the deterministic local one.
    pub fn local_only() -> Self {
        Self::new(None, DEFAULT_COLLABORATOR_TIMEOUT)
    }

    pub fn with_client(client: DynTextClient) -> Self {
        Self::new(Some(client), DEFAULT_COLLABORATOR_TIMEOUT)
    }

    pub fn has_collaborator(&self) -> bool {
        self.client.is_some()
    }

    async fn ask_collaborator(
        &self,
        client: &DynTextClient,
        signals: &SignalBundle,
        entries: &[Entry],
    ) -> Result<DraftReport, CollaboratorError> {
        let payload = synth::build_payload(signals, entries);
        let started = Instant::now();
        let call = client.generate(synth::SYSTEM_INSTRUCTION, &payload);
        let outcome = tokio::time::timeout(self.timeout, call).await;
        // failures and timeouts count toward latency too
        insight_metrics::collaborator_latency(started.elapsed());
        let text = match outcome {
            Ok(res) => res?,
            Err(_) => return Err(GenerateError::Timeout(self.timeout).into()),
        };

        let draft = schema::parse_report(&text)?;
        let named = draft.themes.iter().any(|t| !t.theme.trim().is_empty());
        if !named && !signals.theme_counts.is_empty() {
            return Err(ValidationError::NoUsableThemes.into());
        }
        Ok(draft)
    }

    /// Builds the weekly report. Never fails; collaborator problems are folded
    /// into `collaborator_error`.
    pub async fn weekly_insights(&self, entries: &[Entry]) -> WeeklyInsightResult {
        let batch = crate::anon_hash_entries(entries);
        let signals = signals::extract_signals(entries);
        debug!(
            target: "insight",
            %batch,
            entries = entries.len(),
            candidates = signals.theme_counts.len(),
            score = signals.polarity_score,
            "signals extracted"
        );

        // Local report is always computed so a failed call costs nothing extra.
        let fallback = synth::fallback_report(&signals);

        let mut used_collaborator = false;
        let mut collaborator_error = None;
        let mut draft = fallback;

        if let Some(client) = &self.client {
            match self.ask_collaborator(client, &signals, entries).await {
                Ok(reply) => {
                    used_collaborator = true;
                    draft = reply;
                    insight_metrics::collaborator_used();
                }
                Err(e) => {
                    warn!(
                        target: "insight",
                        %batch,
                        provider = client.provider_name(),
                        error = %e,
                        "collaborator failed; using local report"
                    );
                    insight_metrics::collaborator_failed();
                    collaborator_error = Some(e.to_string());
                }
            }
        }

        let responses = signals::responses(entries);
        let report = normalize::normalize(draft, &responses, &signals.repeating_phrases);
        let plain = normalize::render_plain(&report);

        info!(
            target: "insight",
            %batch,
            themes = report.themes.len(),
            polarity = %report.polarity,
            used_collaborator,
            "weekly report ready"
        );

        WeeklyInsightResult {
            themes: report.themes,
            summary: report.summary,
            polarity: report.polarity,
            repeating_phrases: report.repeating_phrases,
            themes_plain: signals.themes,
            report: plain,
            used_collaborator,
            collaborator_error,
        }
    }
}
