//! Tokenizer and lexicon-based polarity scoring.
//!
//! Everything here is pure: same text in, same tokens/score out.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z']+").expect("word regex"));

/// Function words and journaling filler that never make a useful theme.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "to", "of", "in", "on", "for", "with", "at", "by",
        "is", "are", "was", "were", "be", "been", "being", "it", "that", "this", "as", "i", "you",
        "we", "my", "your", "our", "me", "us", "they", "them", "he", "she", "his", "her", "its",
        "today", "week", "really", "just", "like", "got", "get", "about", "i'm", "i've", "i'll",
        "i'd", "it's", "that's", "don't", "didn't", "have", "has", "had", "not", "all", "can",
        "will", "would", "could", "what", "when", "from", "into", "out", "so", "too", "very",
        "also", "there", "their", "then", "than", "because", "do", "does", "did", "am", "some",
        "more", "much", "how", "who", "which", "while", "off", "over", "after", "before", "again",
        "still", "even", "lot", "things", "thing",
    ]
    .into_iter()
    .collect()
});

static POSITIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "calm", "good", "great", "proud", "excited", "happy", "relieved", "grateful", "energized",
        "hopeful", "confident", "peaceful", "motivated",
    ]
    .into_iter()
    .collect()
});

// Must stay disjoint from POSITIVE.
static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "tired", "anxious", "worried", "sad", "angry", "overwhelmed", "stressed", "upset",
        "frustrated", "guilty", "lonely", "burnt", "burned",
    ]
    .into_iter()
    .collect()
});

/// Overall emotional direction of a batch of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Neutral => "neutral",
            Polarity::Negative => "negative",
        }
    }

    /// Lenient parse used on collaborator output: anything unknown is neutral.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Polarity::Positive,
            "negative" => Polarity::Negative,
            _ => Polarity::Neutral,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased alphabetic runs (apostrophes kept), no filtering.
fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Theme tokens: lowercase words of 3+ chars that are not stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= 3 && !is_stopword(w))
        .collect()
}

/// +1 per positive lexicon hit, -1 per negative hit.
pub fn polarity_score(text: &str) -> i32 {
    words(text).iter().fold(0, |acc, w| {
        let w = w.as_str();
        let mut delta = 0;
        if POSITIVE.contains(w) {
            delta += 1;
        }
        if NEGATIVE.contains(w) {
            delta -= 1;
        }
        acc + delta
    })
}

/// Fixed thresholds: >= 2 positive, <= -2 negative, neutral otherwise.
pub fn label_polarity(total_score: i32) -> Polarity {
    if total_score >= 2 {
        Polarity::Positive
    } else if total_score <= -2 {
        Polarity::Negative
    } else {
        Polarity::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_short_words() {
        let toks = tokenize("I went to the Gym and ran 5k, it's OK");
        assert_eq!(toks, vec!["went", "gym", "ran"]);
    }

    #[test]
    fn tokenize_keeps_apostrophes_inside_words() {
        let toks = tokenize("Mom's garden");
        assert_eq!(toks, vec!["mom's", "garden"]);
    }

    #[test]
    fn polarity_counts_both_lexicons() {
        assert_eq!(polarity_score("Happy and GRATEFUL but tired"), 1);
        assert_eq!(polarity_score("anxious, worried"), -2);
        assert_eq!(polarity_score(""), 0);
    }

    #[test]
    fn lexicons_are_disjoint() {
        assert!(POSITIVE.is_disjoint(&NEGATIVE));
    }

    #[test]
    fn label_thresholds_are_exact() {
        assert_eq!(label_polarity(2), Polarity::Positive);
        assert_eq!(label_polarity(1), Polarity::Neutral);
        assert_eq!(label_polarity(0), Polarity::Neutral);
        assert_eq!(label_polarity(-1), Polarity::Neutral);
        assert_eq!(label_polarity(-2), Polarity::Negative);
    }

    #[test]
    fn coerce_unknown_polarity_to_neutral() {
        assert_eq!(Polarity::coerce(" Positive "), Polarity::Positive);
        assert_eq!(Polarity::coerce("NEGATIVE"), Polarity::Negative);
        assert_eq!(Polarity::coerce("mixed"), Polarity::Neutral);
    }
}
