//! Signal extraction: token frequencies, summed polarity, repeating phrases.
//!
//! Only `response` text is mined. Prompts are app-authored and would otherwise
//! leak the app's own vocabulary into the user's themes.

use std::collections::HashMap;

use serde::Serialize;

use super::lexicon::{label_polarity, polarity_score, tokenize, Polarity};
use super::phrases::repeating_phrases;
use crate::entry::Entry;

pub const MAX_THEMES: usize = 8;
pub const MAX_THEME_COUNTS: usize = 30;
pub const FALLBACK_CANDIDATES: usize = 5;

/// Derived per-request signals. Recomputed for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SignalBundle {
    /// Top tokens by frequency (ties: first seen wins).
    pub themes: Vec<String>,
    /// (token, count), ranked by count descending.
    pub theme_counts: Vec<(String, usize)>,
    pub polarity: Polarity,
    pub polarity_score: i32,
    pub repeating_phrases: Vec<String>,
}

impl SignalBundle {
    /// Top five candidates for the local fallback report.
    pub fn fallback_candidates(&self) -> &[(String, usize)] {
        let n = self.theme_counts.len().min(FALLBACK_CANDIDATES);
        &self.theme_counts[..n]
    }
}

/// Frequency table that remembers first-seen order for stable tie-breaks.
#[derive(Default)]
struct TokenTally {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl TokenTally {
    fn add(&mut self, token: String) {
        match self.index.get(&token) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(token.clone(), self.order.len());
                self.order.push((token, 1));
            }
        }
    }

    fn ranked(mut self) -> Vec<(String, usize)> {
        // stable: equal counts keep insertion order
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order
    }
}

/// Non-empty, trimmed responses in input order.
pub fn responses(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .map(|e| e.response.trim())
        .filter(|r| !r.is_empty())
        .collect()
}

pub fn extract_signals(entries: &[Entry]) -> SignalBundle {
    let texts = responses(entries);

    let mut tally = TokenTally::default();
    let mut score = 0i32;
    for text in &texts {
        for tok in tokenize(text) {
            tally.add(tok);
        }
        score += polarity_score(text);
    }

    let mut ranked = tally.ranked();
    let themes = ranked
        .iter()
        .take(MAX_THEMES)
        .map(|(t, _)| t.clone())
        .collect();
    ranked.truncate(MAX_THEME_COUNTS);

    SignalBundle {
        themes,
        theme_counts: ranked,
        polarity: label_polarity(score),
        polarity_score: score,
        repeating_phrases: repeating_phrases(&texts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(prompt: &str, response: &str) -> Entry {
        Entry::new(prompt, response, 0)
    }

    #[test]
    fn prompts_are_never_mined() {
        let entries = vec![e(
            "What made you grateful and happy and proud?",
            "Cooking dinner",
        )];
        let s = extract_signals(&entries);
        assert_eq!(s.themes, vec!["cooking", "dinner"]);
        assert_eq!(s.polarity_score, 0);
        assert_eq!(s.polarity, Polarity::Neutral);
    }

    #[test]
    fn ranks_by_count_then_first_seen() {
        let entries = vec![
            e("p", "guitar practice, then running"),
            e("p", "running again and guitar"),
            e("p", "running late"),
        ];
        let s = extract_signals(&entries);
        assert_eq!(s.themes[..3], ["running", "guitar", "practice"]);
        assert_eq!(s.theme_counts[0], ("running".to_string(), 3));
        assert_eq!(s.theme_counts[1], ("guitar".to_string(), 2));
    }

    #[test]
    fn caps_themes_and_counts() {
        let words: Vec<String> = (0..40).map(|i| format!("word{}", "x".repeat(i + 1))).collect();
        let entries = vec![e("p", &words.join(" "))];
        let s = extract_signals(&entries);
        assert_eq!(s.themes.len(), MAX_THEMES);
        assert_eq!(s.theme_counts.len(), MAX_THEME_COUNTS);
        assert_eq!(s.fallback_candidates().len(), FALLBACK_CANDIDATES);
    }

    #[test]
    fn empty_input_is_neutral_and_empty() {
        let s = extract_signals(&[]);
        assert!(s.themes.is_empty());
        assert!(s.theme_counts.is_empty());
        assert!(s.repeating_phrases.is_empty());
        assert_eq!(s.polarity, Polarity::Neutral);
        assert!(s.fallback_candidates().is_empty());
    }

    #[test]
    fn worried_exam_scenario() {
        let entries = vec![e(
            "How are you?",
            "I feel anxious about my exam and I'm worried about my grades",
        )];
        let s = extract_signals(&entries);
        assert_eq!(s.polarity_score, -2);
        assert_eq!(s.polarity, Polarity::Negative);
        assert!(s.themes.contains(&"exam".to_string()));
        assert!(s.themes.contains(&"grades".to_string()));
        assert_eq!(s.repeating_phrases, vec!["“I feel…”", "“I’m worried…”"]);
    }
}
