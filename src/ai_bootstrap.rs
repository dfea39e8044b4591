// src/ai_bootstrap.rs
use crate::config::ai::AiConfig;
use crate::insight::ai_adapter::{build_client_from_config, DynTextClient};
use crate::insight::InsightEngine;
use tracing::{info, warn};

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub client: Option<DynTextClient>,
}

impl AiRuntime {
    /// Config problems only disable the collaborator; they never stop startup.
    pub fn from_env() -> Self {
        let cfg = match AiConfig::load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "AI config unusable; collaborator disabled");
                AiConfig::default()
            }
        };
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "AI cfg loaded: provider={}, model={}, enabled={}, key_len={}",
            cfg.provider,
            cfg.model,
            cfg.enabled,
            cfg.api_key.len()
        );
        let client = build_client_from_config(&cfg);
        Self { cfg, client }
    }

    pub fn into_engine(self) -> InsightEngine {
        let timeout = self.cfg.timeout();
        InsightEngine::new(self.client, timeout)
    }
}
