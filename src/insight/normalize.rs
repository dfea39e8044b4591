//! Normalization and repair of a draft report into the final result shape.
//!
//! Rules, in order: keep ≤5 named themes, clamp percents to 0..=100, force the
//! percent sum to 100, coerce polarity, keep ≤3 phrases, backfill thin details.

use serde::{Deserialize, Serialize};

use super::details::{backfill_details, merge_details, MAX_DETAILS};
use super::lexicon::Polarity;
use super::schema::{DraftReport, DraftTheme};
use super::phrases::MAX_PHRASES;

pub const MAX_RESULT_THEMES: usize = 5;
pub const MAX_SUMMARY_WORDS: usize = 80;
const MIN_DETAILS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeObject {
    pub theme: String,
    pub percent: u8,
    pub details: Vec<String>,
}

/// Repaired report, before the engine attaches collaborator metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    pub themes: Vec<ThemeObject>,
    pub summary: String,
    pub polarity: Polarity,
    pub repeating_phrases: Vec<String>,
}

/// Rounds half away from zero and clamps into 0..=100. NaN becomes 0.
pub fn clamp_percent(raw: f64) -> i64 {
    if !raw.is_finite() {
        return 0;
    }
    (raw.round() as i64).clamp(0, 100)
}

/// Makes the residual land on the first theme. If that would push it below 0,
/// the leftover deficit is taken from the largest other themes.
fn settle_residual(percents: &mut [i64]) {
    let sum: i64 = percents.iter().sum();
    percents[0] += 100 - sum;
    while percents[0] < 0 {
        let deficit = -percents[0];
        percents[0] = 0;
        let Some((idx, _)) = percents
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        else {
            break;
        };
        percents[idx] -= deficit;
        if percents[idx] < 0 {
            percents[0] = percents[idx];
            percents[idx] = 0;
        }
    }
}

/// Forces a non-empty percent list to sum to exactly 100.
pub fn rebalance(percents: &mut [i64]) {
    let n = percents.len();
    if n == 0 {
        return;
    }
    let sum: i64 = percents.iter().sum();
    if sum == 100 {
        return;
    }
    if sum <= 0 {
        let even = 100 / n as i64;
        percents.iter_mut().for_each(|p| *p = even);
        percents[0] += 100 - even * n as i64;
        return;
    }
    for p in percents.iter_mut() {
        *p = (*p as f64 * 100.0 / sum as f64).round() as i64;
    }
    settle_residual(percents);
}

/// Cuts to `max` words, marking the cut with an ellipsis.
pub fn cap_words(text: &str, max: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max {
        return text.trim().to_string();
    }
    format!("{}…", words[..max].join(" "))
}

fn clean_phrases(phrases: Vec<String>) -> Vec<String> {
    phrases
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_PHRASES)
        .collect()
}

/// Steps 1-3: named themes only, at most five, percents summing to 100.
pub fn repair_themes(themes: Vec<DraftTheme>) -> Vec<ThemeObject> {
    let kept: Vec<DraftTheme> = themes
        .into_iter()
        .filter(|t| !t.theme.trim().is_empty())
        .take(MAX_RESULT_THEMES)
        .collect();

    let mut percents: Vec<i64> = kept.iter().map(|t| clamp_percent(t.percent)).collect();
    rebalance(&mut percents);

    kept.into_iter()
        .zip(percents)
        .map(|(t, pct)| ThemeObject {
            theme: t.theme.trim().to_string(),
            percent: pct.clamp(0, 100) as u8,
            details: merge_details(t.details, Vec::new()),
        })
        .collect()
}

/// Full repair. `responses` are the non-empty user responses used for backfill;
/// `fallback_phrases` replace a missing `repeating_phrases` field.
pub fn normalize(
    draft: DraftReport,
    responses: &[&str],
    fallback_phrases: &[String],
) -> NormalizedReport {
    let mut themes = repair_themes(draft.themes);

    for t in themes.iter_mut() {
        if t.details.len() < MIN_DETAILS {
            let extra = backfill_details(&t.theme, responses);
            t.details = merge_details(std::mem::take(&mut t.details), extra);
        }
        t.details.truncate(MAX_DETAILS);
    }

    let phrases = draft
        .repeating_phrases
        .unwrap_or_else(|| fallback_phrases.to_vec());

    NormalizedReport {
        themes,
        summary: cap_words(&draft.summary, MAX_SUMMARY_WORDS),
        polarity: Polarity::coerce(&draft.polarity),
        repeating_phrases: clean_phrases(phrases),
    }
}

/// Legacy multi-line plain-text rendering for older consumers.
pub fn render_plain(report: &NormalizedReport) -> String {
    let themes = if report.themes.is_empty() {
        "None".to_string()
    } else {
        report
            .themes
            .iter()
            .map(|t| t.theme.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let phrases = if report.repeating_phrases.is_empty() {
        "None".to_string()
    } else {
        report.repeating_phrases.join(", ")
    };
    format!(
        "Themes: {themes}\nPolarity: {}\nRepeating phrases: {phrases}\nSummary: {}",
        report.polarity, report.summary
    )
}
