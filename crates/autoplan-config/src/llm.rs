//! Configuration for the structured LLM client (C2).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which configured backend to prefer, and how to fall back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmBackendKind {
    Opus,
    Haiku,
    OllamaLocal,
    ClaudeCli,
}

impl Default for LlmBackendKind {
    fn default() -> Self {
        Self::Haiku
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: LlmBackendKind,
    pub fallback_chain: Vec<LlmBackendKind>,
    pub anthropic_api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub default_timeout_secs: u64,
    pub ollama_endpoint: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackendKind::default(),
            fallback_chain: vec![LlmBackendKind::Haiku, LlmBackendKind::ClaudeCli],
            anthropic_api_key_env: "ANTHROPIC_API_KEY".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            default_timeout_secs: 300,
            ollama_endpoint: "http://localhost:11434".to_string(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}
