//! Report synthesis: the local fallback report and the collaborator request.

use serde::Serialize;

use super::schema::{DraftReport, DraftTheme};
use super::signals::SignalBundle;
use crate::entry::Entry;

pub const MAX_SNIPPETS: usize = 14;
pub const SNIPPET_CHARS: usize = 280;

/// Fixed output contract sent as the system instruction.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a supportive self-discovery coach writing a WEEKLY reflection report.
The user is NOT an experienced journaler. Keep it warm, specific, and non-judgmental.
Do NOT diagnose or mention therapy. Do NOT mention that you are an AI.

Return ONE JSON object and nothing else, with exactly these fields:
{
  "themes": [
    {"theme": "<1-3 words>", "percent": <integer 0-100>, "details": ["<fragment>", "<fragment>"]}
  ],
  "polarity": "positive" | "neutral" | "negative",
  "repeating_phrases": ["<phrase>"],
  "summary": "<narrative>"
}

Rules:
- At most 5 themes. Percentages are integers and must sum to exactly 100.
- Each theme has 2-3 details. A detail is a concrete fragment of at most 4 words taken
  only from the user's own responses. Never take details from the journaling prompts
  or from these instructions.
- Prefer the candidate themes provided, merging near-duplicates into one theme.
- At most 3 repeating phrases, copied from the detected phrases.
- The summary is at most 80 words, 2-4 sentences, for example:
  "This week, you wrote most about X, Y, Z. You felt most energized when talking about A and B."
- Avoid cliches and excessive cheerleading. If entries are sparse, acknowledge it lightly."#;

#[derive(Serialize)]
struct Candidate<'a> {
    token: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct PolarityOut<'a> {
    label: &'a str,
    score: i32,
}

#[derive(Serialize)]
struct Payload<'a> {
    candidate_themes: Vec<Candidate<'a>>,
    polarity: PolarityOut<'a>,
    repeating_phrases: &'a [String],
    responses: Vec<String>,
}

/// Truncates on a char boundary and marks the cut.
fn snippet(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SNIPPET_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// User payload for the collaborator. Carries responses only, never prompts.
pub fn build_payload(signals: &SignalBundle, entries: &[Entry]) -> String {
    let payload = Payload {
        candidate_themes: signals
            .theme_counts
            .iter()
            .map(|(token, count)| Candidate {
                token,
                count: *count,
            })
            .collect(),
        polarity: PolarityOut {
            label: signals.polarity.as_str(),
            score: signals.polarity_score,
        },
        repeating_phrases: &signals.repeating_phrases,
        responses: entries
            .iter()
            .map(|e| e.response.trim())
            .filter(|r| !r.is_empty())
            .take(MAX_SNIPPETS)
            .map(snippet)
            .collect(),
    };
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
}

/// Default wording when there are no themes to name.
pub const NO_THEMES_TEXT: &str = "a few recurring topics";

pub fn fallback_summary(signals: &SignalBundle, theme_names: &[String]) -> String {
    let topics = if theme_names.is_empty() {
        NO_THEMES_TEXT.to_string()
    } else {
        theme_names
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut s = format!(
        "This week, you wrote most about {topics}. Overall tone: {}.",
        signals.polarity
    );
    if !signals.repeating_phrases.is_empty() {
        s.push_str(&format!(
            " Common phrasing included {}.",
            signals.repeating_phrases.join(", ")
        ));
    }
    s
}

/// `round(count * 100 / total)` per candidate; drift goes to the first theme.
pub fn fallback_percents(counts: &[usize]) -> Vec<i64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut out: Vec<i64> = counts
        .iter()
        .map(|&c| (c as f64 * 100.0 / total as f64).round() as i64)
        .collect();
    let sum: i64 = out.iter().sum();
    out[0] += 100 - sum;
    out
}

/// Fully local report. Details are left empty for the normalizer to backfill.
pub fn fallback_report(signals: &SignalBundle) -> DraftReport {
    let candidates = signals.fallback_candidates();
    let counts: Vec<usize> = candidates.iter().map(|(_, c)| *c).collect();
    let percents = fallback_percents(&counts);

    let themes: Vec<DraftTheme> = candidates
        .iter()
        .zip(percents)
        .map(|((name, _), pct)| DraftTheme {
            theme: name.clone(),
            percent: pct as f64,
            details: Vec::new(),
        })
        .collect();

    let names: Vec<String> = themes.iter().map(|t| t.theme.clone()).collect();
    DraftReport {
        summary: fallback_summary(signals, &names),
        polarity: signals.polarity.as_str().to_string(),
        repeating_phrases: Some(signals.repeating_phrases.clone()),
        themes,
    }
}
