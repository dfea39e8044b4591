//! Detail backfill: short concrete fragments for a theme, mined from responses.
//!
//! Title-cased phrases ("Coffee Lab", "Aunt May") are preferred; frequent
//! non-stopword tokens fill whatever slots remain.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::lexicon::tokenize;

pub const MAX_DETAILS: usize = 3;

static TITLE_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z']+(?:[ \t]+[A-Z][a-z']+){0,2}\b").expect("title phrase regex")
});

/// Capitalized only because they start a sentence (or are pronoun-ish).
static GENERIC_STARTERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "The", "This", "That", "These", "Those", "Today", "Tonight", "Yesterday", "Tomorrow",
        "My", "Our", "We", "It", "It's", "I'm", "I've", "I'll", "I'd", "And", "But", "So", "Or", "When", "Then",
        "Also", "Just", "He", "She", "They", "There", "What", "Why", "How", "If", "In", "On", "At",
        "After", "Before", "Maybe", "Still", "Really", "Some", "Lately", "Overall", "Later",
        "Now", "Not", "No", "Yes", "Sometimes", "Even", "Every", "Feeling", "Felt", "Went",
        "Had", "Got", "Was", "Is", "Are", "Do", "Did", "Will", "Can", "Could", "Should",
        "Would", "Been", "Being", "Week", "Morning", "Evening", "Afternoon", "Night",
    ]
    .into_iter()
    .collect()
});

/// Drops leading sentence-starter words; `None` if nothing is left.
fn strip_starters(phrase: &str) -> Option<String> {
    let words: Vec<&str> = phrase
        .split_whitespace()
        .skip_while(|w| GENERIC_STARTERS.contains(w))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Counts items, ranking by count descending with first-seen order on ties.
fn rank(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for it in items {
        match index.get(&it) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(it.clone(), order.len());
                order.push((it, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().map(|(s, _)| s).collect()
}

fn at_sentence_start(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end_matches(|c: char| c == ' ' || c == '\t');
    before.is_empty()
        || before.ends_with(|c: char| matches!(c, '.' | '!' | '?' | '\n' | ':' | ';' | '"' | '“'))
}

fn title_phrases(texts: &[&str], theme_lower: &str) -> Vec<String> {
    let mut found = Vec::new();
    for text in texts {
        for m in TITLE_PHRASE_RE.find_iter(text) {
            let phrase = m.as_str();
            // a lone capitalized word opening a sentence is just grammar
            if at_sentence_start(text, m.start()) && !phrase.contains(char::is_whitespace) {
                continue;
            }
            if let Some(p) = strip_starters(phrase) {
                if !p.to_lowercase().contains(theme_lower) {
                    found.push(p);
                }
            }
        }
    }
    rank(found)
}

/// Texts that mention the theme (case-insensitive substring), or every
/// non-empty response when none do.
fn matching_texts<'a>(theme_lower: &str, responses: &[&'a str]) -> Vec<&'a str> {
    let hits: Vec<&str> = responses
        .iter()
        .copied()
        .filter(|r| r.to_lowercase().contains(theme_lower))
        .collect();
    if hits.is_empty() {
        responses.to_vec()
    } else {
        hits
    }
}

/// Title phrases first, then frequent tokens that are not part of the theme.
fn extract_from(texts: &[&str], theme_lower: &str) -> Vec<String> {
    let theme_words: Vec<&str> = theme_lower.split_whitespace().collect();

    let mut out: Vec<String> = title_phrases(texts, theme_lower)
        .into_iter()
        .take(MAX_DETAILS)
        .collect();

    if out.len() < MAX_DETAILS {
        let tokens = texts.iter().flat_map(|t| tokenize(t));
        for tok in rank(tokens) {
            if out.len() >= MAX_DETAILS {
                break;
            }
            let taken = out
                .iter()
                .any(|d| d.to_lowercase().split_whitespace().any(|w| w == tok));
            if tok == theme_lower || theme_words.contains(&tok.as_str()) || taken {
                continue;
            }
            out.push(tok);
        }
    }
    out
}

/// Up to three detail fragments for `theme`. Responses mentioning the theme
/// are mined first; if they yield nothing, every response is. Empty only when
/// the whole corpus has nothing extractable.
pub fn backfill_details(theme: &str, responses: &[&str]) -> Vec<String> {
    let theme_lower = theme.trim().to_lowercase();
    if theme_lower.is_empty() {
        return Vec::new();
    }
    let texts = matching_texts(&theme_lower, responses);
    let out = extract_from(&texts, &theme_lower);
    if out.is_empty() && texts.len() < responses.len() {
        return extract_from(responses, &theme_lower);
    }
    out
}

/// Keeps existing details and tops them up to three without duplicates.
pub fn merge_details(existing: Vec<String>, extra: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_DETAILS);
    for d in existing.into_iter().chain(extra) {
        if out.len() >= MAX_DETAILS {
            break;
        }
        let d = d.trim().to_string();
        if d.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(&d)) {
            continue;
        }
        out.push(d);
    }
    out
}
