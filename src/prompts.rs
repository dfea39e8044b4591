// src/prompts.rs
//! Prompt of the day: a read-only corpus loaded once at startup plus a
//! deterministic date → prompt rotation.
//!
//! Categories rotate day by day; each time a category comes around again the
//! next prompt inside it is used.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_PROMPTS_PATH: &str = "data/prompts.json";
pub const ENV_PROMPTS_PATH: &str = "PROMPTS_PATH";

pub const CATEGORIES: [&str; 5] = ["values", "emotions", "identity", "growth", "relationships"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptItem {
    id: String,
    prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPrompt {
    pub id: String,
    pub category: String,
    pub prompt: String,
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PromptCorpus {
    /// Same order as `CATEGORIES`.
    by_category: Vec<Vec<PromptItem>>,
}

impl PromptCorpus {
    /// Parses and validates the corpus: every category present and non-empty,
    /// every item with a non-empty id and prompt.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut data: HashMap<String, Vec<RawItem>> =
            serde_json::from_str(raw).context("prompts corpus is not valid JSON")?;

        let mut by_category = Vec::with_capacity(CATEGORIES.len());
        for cat in CATEGORIES {
            let items = data.remove(cat).unwrap_or_default();
            if items.is_empty() {
                bail!("Category '{cat}' missing or empty in prompts corpus");
            }
            let mut normalized = Vec::with_capacity(items.len());
            for item in items {
                let id = item.id.filter(|s| !s.trim().is_empty());
                let prompt = item.prompt.filter(|s| !s.trim().is_empty());
                match (id, prompt) {
                    (Some(id), Some(prompt)) => normalized.push(PromptItem { id, prompt }),
                    _ => return Err(anyhow!("Invalid prompt item in category '{cat}'")),
                }
            }
            by_category.push(normalized);
        }
        Ok(Self { by_category })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("prompts corpus not found at {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// `$PROMPTS_PATH`, else `data/prompts.json`.
    pub fn load_default() -> Result<Self> {
        let path =
            std::env::var(ENV_PROMPTS_PATH).unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.to_string());
        Self::load_from_file(path)
    }

    pub fn prompt_for_date(&self, date: NaiveDate) -> DailyPrompt {
        // proleptic Gregorian ordinal: 0001-01-01 is day 1
        let ordinal = i64::from(date.num_days_from_ce());
        let n = CATEGORIES.len() as i64;
        let cat_idx = ordinal.rem_euclid(n) as usize;
        let items = &self.by_category[cat_idx];
        let cycle = ordinal.div_euclid(n);
        let item = &items[cycle.rem_euclid(items.len() as i64) as usize];
        DailyPrompt {
            id: item.id.clone(),
            category: CATEGORIES[cat_idx].to_string(),
            prompt: item.prompt.clone(),
        }
    }

    pub fn prompt_for_today(&self) -> DailyPrompt {
        self.prompt_for_date(chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> PromptCorpus {
        PromptCorpus::from_json(
            r#"{
                "values": [{"id":"v1","prompt":"V one"},{"id":"v2","prompt":"V two"}],
                "emotions": [{"id":"e1","prompt":"E one"}],
                "identity": [{"id":"i1","prompt":"I one"}],
                "growth": [{"id":"g1","prompt":"G one"},{"id":"g2","prompt":"G two"},{"id":"g3","prompt":"G three"}],
                "relationships": [{"id":"r1","prompt":"R one"}]
            }"#,
        )
        .expect("valid corpus")
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    #[test]
    fn category_rotates_by_ordinal() {
        let c = corpus();
        // 2024-01-01 has ordinal 738886; 738886 % 5 == 1 → emotions
        assert_eq!(d(2024, 1, 1).num_days_from_ce(), 738_886);
        assert_eq!(c.prompt_for_date(d(2024, 1, 1)).category, "emotions");
        assert_eq!(c.prompt_for_date(d(2024, 1, 2)).category, "identity");
        assert_eq!(c.prompt_for_date(d(2024, 1, 5)).category, "values");
    }

    #[test]
    fn prompt_advances_each_cycle() {
        let c = corpus();
        // 738888 % 5 == 3 → growth, and again five days later
        let first = c.prompt_for_date(d(2024, 1, 3));
        assert_eq!(first.category, "growth");
        let next = c.prompt_for_date(d(2024, 1, 8));
        assert_eq!(next.category, "growth");
        assert_ne!(first.id, next.id);
        // 738888 / 5 = 147777, 147777 % 3 = 0
        assert_eq!(first.id, "g1");
        assert_eq!(next.id, "g2");
    }

    #[test]
    fn same_day_is_stable() {
        let c = corpus();
        assert_eq!(c.prompt_for_date(d(2025, 6, 1)), c.prompt_for_date(d(2025, 6, 1)));
    }

    #[test]
    fn rejects_missing_category_and_bad_items() {
        let err = PromptCorpus::from_json(r#"{"values":[{"id":"v","prompt":"p"}]}"#).unwrap_err();
        assert!(err.to_string().contains("emotions"));

        let bad = r#"{
            "values": [{"id":"v1"}],
            "emotions": [{"id":"e1","prompt":"E"}],
            "identity": [{"id":"i1","prompt":"I"}],
            "growth": [{"id":"g1","prompt":"G"}],
            "relationships": [{"id":"r1","prompt":"R"}]
        }"#;
        assert!(PromptCorpus::from_json(bad).is_err());
        assert!(PromptCorpus::load_from_file("__no_such_prompts__.json").is_err());
    }
}
