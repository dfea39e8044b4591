// tests/ai_adapter_stub.rs
// Mutates process env, so every test here is #[serial].

use std::env;

use reflection_insights::ai_adapter::{MockClient, TextGenerationClient};
use reflection_insights::ai_bootstrap::AiRuntime;
use reflection_insights::Entry;
use serial_test::serial;

/// Snapshot & restore env vars around a test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}
impl EnvSnapshot {
    fn set(pairs: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            saved.push((k.to_string(), env::var(k).ok()));
            match v {
                Some(val) => env::set_var(k, val),
                None => env::remove_var(k),
            }
        }
        Self { saved }
    }
}
impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, maybe_v) in self.saved.drain(..) {
            match maybe_v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

const NO_KEYS: [(&str, Option<&str>); 4] = [
    ("GEMINI_API_KEY", None),
    ("GOOGLE_API_KEY", None),
    ("OPENAI_API_KEY", None),
    ("INSIGHTS_AI_CONFIG", Some("config/does-not-exist.json")),
];

#[tokio::test]
async fn mock_client_returns_its_reply() {
    let client = MockClient::new("{\"ok\":true}");
    let out = client.generate("system", "payload").await.unwrap();
    assert_eq!(out, "{\"ok\":true}");
    assert_eq!(client.provider_name(), "mock");
}

#[tokio::test]
#[serial]
async fn runtime_without_keys_is_local_only() {
    let mut pairs = NO_KEYS.to_vec();
    pairs.push(("AI_TEST_MODE", None));
    let _env = EnvSnapshot::set(&pairs);

    let engine = AiRuntime::from_env().into_engine();
    assert!(!engine.has_collaborator());

    let r = engine
        .weekly_insights(&[Entry::new("p", "Baked bread with Nora, bread again Sunday", 1)])
        .await;
    assert!(!r.used_collaborator);
    assert!(r.collaborator_error.is_none());
    assert_eq!(r.themes[0].theme, "bread");
}

#[tokio::test]
#[serial]
async fn mock_mode_wires_the_canned_collaborator() {
    let mut pairs = NO_KEYS.to_vec();
    pairs.push(("AI_TEST_MODE", Some("mock")));
    let _env = EnvSnapshot::set(&pairs);

    let rt = AiRuntime::from_env();
    assert_eq!(rt.client.as_ref().map(|c| c.provider_name()), Some("mock"));

    let r = rt
        .into_engine()
        .weekly_insights(&[Entry::new("p", "Quiet walk by the river", 1)])
        .await;
    assert!(r.used_collaborator);
    assert_eq!(r.themes[0].theme, "routine");
    assert!(r.summary.ends_with("(mock)"));
}
