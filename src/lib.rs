// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod entry;
pub mod metrics;
pub mod prompts;
pub mod transcribe;

// Weekly insight pipeline (lexicon, phrases, signals, synth, schema, normalize, details)
pub mod insight;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::entry::Entry;
pub use crate::insight::{ai_adapter, InsightEngine, WeeklyInsightResult};

use sha2::{Digest, Sha256};

/// Short, non-reversible id for a batch of entries so logs can correlate a
/// request without ever containing journal text.
pub fn anon_hash_entries(entries: &[Entry]) -> String {
    let mut hasher = Sha256::new();
    for e in entries {
        hasher.update(e.response.as_bytes());
        hasher.update(e.timestamp.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
