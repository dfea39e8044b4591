// src/entry.rs
//! Journal entry as sent by the client, plus request-level input validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROMPT_MAX_CHARS: usize = 300;
pub const RESPONSE_MAX_CHARS: usize = 2000;

/// One journal entry. `prompt` is app-authored; `response` is the user's voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub prompt: String,
    pub response: String,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: i64,
}

impl Entry {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>, timestamp: i64) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyInsightRequest {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("entries[{index}].{field} must not be empty")]
    Empty { index: usize, field: &'static str },
    #[error("entries[{index}].{field} exceeds {max} characters")]
    TooLong {
        index: usize,
        field: &'static str,
        max: usize,
    },
}

fn check_len(index: usize, field: &'static str, value: &str, max: usize) -> Result<(), EntryError> {
    let n = value.chars().count();
    if n == 0 {
        return Err(EntryError::Empty { index, field });
    }
    if n > max {
        return Err(EntryError::TooLong { index, field, max });
    }
    Ok(())
}

impl WeeklyInsightRequest {
    /// Rejects the first malformed entry; the engine never sees invalid input.
    pub fn validate(&self) -> Result<(), EntryError> {
        for (i, e) in self.entries.iter().enumerate() {
            check_len(i, "prompt", &e.prompt, PROMPT_MAX_CHARS)?;
            check_len(i, "response", &e.response, RESPONSE_MAX_CHARS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(entries: Vec<Entry>) -> WeeklyInsightRequest {
        WeeklyInsightRequest { entries }
    }

    #[test]
    fn accepts_well_formed_entries() {
        let r = req(vec![Entry::new("How was today?", "Fine.", 1)]);
        assert!(r.validate().is_ok());
        assert!(req(vec![]).validate().is_ok());
    }

    #[test]
    fn rejects_empty_response_with_index() {
        let r = req(vec![
            Entry::new("p", "ok", 1),
            Entry::new("p", "", 2),
        ]);
        assert_eq!(
            r.validate(),
            Err(EntryError::Empty {
                index: 1,
                field: "response"
            })
        );
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        // 300 multi-byte chars is still within the prompt limit
        let prompt = "é".repeat(PROMPT_MAX_CHARS);
        assert!(req(vec![Entry::new(prompt, "x", 0)]).validate().is_ok());

        let long = "a".repeat(RESPONSE_MAX_CHARS + 1);
        let err = req(vec![Entry::new("p", long, 0)]).validate().unwrap_err();
        assert!(err.to_string().contains("exceeds 2000"));
    }
}
