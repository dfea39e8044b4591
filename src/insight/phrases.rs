//! Repeating first-person phrases ("I feel…", "I'm worried…").
//!
//! Several raw patterns can share one display phrase; their counts combine.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_PHRASES: usize = 3;

/// (pattern, canonical display phrase), in tie-break order.
const PATTERNS: &[(&str, &str)] = &[
    (r"\bi feel\b", "“I feel…”"),
    (r"\bi['’]m worried\b", "“I’m worried…”"),
    (r"\bi am worried\b", "“I’m worried…”"),
    (r"\bi need\b", "“I need…”"),
    (r"\bi want\b", "“I want…”"),
    (r"\bi can['’]t\b", "“I can’t…”"),
    (r"\bi cannot\b", "“I can’t…”"),
    (r"\bi should\b", "“I should…”"),
    (r"\bi['’]m afraid\b", "“I’m afraid…”"),
    (r"\bi am afraid\b", "“I’m afraid…”"),
];

static COMPILED: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .map(|(pat, label)| (Regex::new(pat).expect("phrase regex"), *label))
        .collect()
});

/// Combined match count per canonical phrase, in first-pattern order.
/// Phrases with zero matches are omitted.
pub fn phrase_counts<S: AsRef<str>>(responses: &[S]) -> Vec<(&'static str, usize)> {
    let joined = responses
        .iter()
        .map(|r| r.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for (re, label) in COMPILED.iter() {
        let label = *label;
        let n = re.find_iter(&joined).count();
        if n == 0 {
            continue;
        }
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, c)) => *c += n,
            None => counts.push((label, n)),
        }
    }
    counts
}

/// Top three canonical phrases by combined count; ties keep pattern order.
pub fn repeating_phrases<S: AsRef<str>>(responses: &[S]) -> Vec<String> {
    let mut counts = phrase_counts(responses);
    // sort_by is stable, so equal counts stay in pattern order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_PHRASES)
        .map(|(label, _)| label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contraction_and_expanded_forms_combine() {
        let texts = ["I am worried about rent.", "I'm worried again. I feel fine."];
        let counts = phrase_counts(&texts);
        assert_eq!(counts, vec![("“I feel…”", 1), ("“I’m worried…”", 2)]);
        assert_eq!(
            repeating_phrases(&texts),
            vec!["“I’m worried…”".to_string(), "“I feel…”".to_string()]
        );
    }

    #[test]
    fn ties_follow_pattern_order_and_cap_at_three() {
        let texts = ["I should rest. I want quiet. I need sleep. I feel slow."];
        assert_eq!(
            repeating_phrases(&texts),
            vec!["“I feel…”", "“I need…”", "“I want…”"]
        );
    }

    #[test]
    fn no_matches_means_no_phrases() {
        let texts = ["Walked the dog", "Feeling fine"];
        assert!(repeating_phrases(&texts).is_empty());
        assert!(repeating_phrases::<&str>(&[]).is_empty());
    }

    #[test]
    fn word_boundaries_are_respected() {
        // "i feeling" and "hi need" must not count
        let texts = ["hi need a break, i feeling odd"];
        assert!(repeating_phrases(&texts).is_empty());
    }

    #[test]
    fn typographic_apostrophe_is_accepted() {
        let texts = ["I can’t sleep"];
        assert_eq!(repeating_phrases(&texts), vec!["“I can’t…”"]);
    }
}
