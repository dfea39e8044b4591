// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "INSIGHTS_AI_CONFIG";

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

fn default_timeout_secs() -> u64 {
    20
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_output_tokens() -> u32 {
    600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "gemini" | "openai" (case-insensitive)
    pub provider: String,
    /// Empty means the provider default.
    #[serde(default)]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY / GOOGLE_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "gemini".to_string(),
            model: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn gemini_key_from_env() -> Option<String> {
    non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "gemini" => gemini_key_from_env().ok_or_else(|| {
                    anyhow::anyhow!("Missing GEMINI_API_KEY / GOOGLE_API_KEY env var")
                })?,
                "openai" => non_empty_env("OPENAI_API_KEY")
                    .ok_or_else(|| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        cfg.sanitize();
        Ok(cfg)
    }

    /// Env-only configuration, used when no config file exists.
    /// Gemini wins when both keys are present.
    pub fn from_env() -> Self {
        let mut cfg = AiConfig::default();
        if let Some(key) = gemini_key_from_env() {
            cfg.enabled = true;
            cfg.provider = "gemini".to_string();
            cfg.api_key = key;
            cfg.model = non_empty_env("GEMINI_MODEL").unwrap_or_default();
        } else if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            cfg.enabled = true;
            cfg.provider = "openai".to_string();
            cfg.api_key = key;
            cfg.model = non_empty_env("OPENAI_MODEL").unwrap_or_default();
        }
        if let Some(secs) = non_empty_env("AI_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            cfg.timeout_secs = secs;
        }
        cfg.sanitize();
        cfg
    }

    /// File if present (path from `INSIGHTS_AI_CONFIG` or the default), else env.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = env::var(ENV_AI_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_AI_CONFIG_PATH.into());
        if Path::new(&path).exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::from_env())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn sanitize(&mut self) {
        if self.model.trim().is_empty() {
            self.model = match self.provider.as_str() {
                "openai" => DEFAULT_OPENAI_MODEL,
                _ => DEFAULT_GEMINI_MODEL,
            }
            .to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.max_output_tokens == 0 {
            self.max_output_tokens = default_max_output_tokens();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_keys() {
        for k in [
            "GEMINI_API_KEY",
            "GOOGLE_API_KEY",
            "OPENAI_API_KEY",
            "GEMINI_MODEL",
            "AI_TIMEOUT_SECS",
        ] {
            env::remove_var(k);
        }
    }

    fn write_tmp(name: &str, body: &str) -> std::path::PathBuf {
        let p = env::temp_dir().join(format!("reflection-insights-{}-{name}", std::process::id()));
        fs::write(&p, body).expect("write tmp config");
        p
    }

    #[test]
    #[serial]
    fn env_without_keys_is_disabled() {
        clear_keys();
        let cfg = AiConfig::from_env();
        assert!(!cfg.enabled);
    }

    #[test]
    #[serial]
    fn env_gemini_key_enables_gemini() {
        clear_keys();
        env::set_var("GOOGLE_API_KEY", "k-123");
        env::set_var("AI_TIMEOUT_SECS", "7");
        let cfg = AiConfig::from_env();
        assert!(cfg.enabled);
        assert_eq!(cfg.provider, "gemini");
        assert_eq!(cfg.api_key, "k-123");
        assert_eq!(cfg.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.timeout(), Duration::from_secs(7));
        clear_keys();
    }

    #[test]
    #[serial]
    fn file_resolves_env_key_and_sanitizes() {
        clear_keys();
        env::set_var("OPENAI_API_KEY", "sk-test");
        let p = write_tmp(
            "ai.json",
            r#"{"enabled":true,"provider":"OpenAI","api_key":"ENV","temperature":9.0,"timeout_secs":0}"#,
        );
        let cfg = AiConfig::load_from_file(&p).expect("load");
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.temperature, default_temperature());
        assert_eq!(cfg.timeout_secs, default_timeout_secs());
        let _ = fs::remove_file(p);
        clear_keys();
    }

    #[test]
    #[serial]
    fn file_with_env_key_but_no_env_fails() {
        clear_keys();
        let p = write_tmp(
            "ai-missing.json",
            r#"{"enabled":true,"provider":"gemini","api_key":"env"}"#,
        );
        assert!(AiConfig::load_from_file(&p).is_err());
        let _ = fs::remove_file(p);
    }
}
