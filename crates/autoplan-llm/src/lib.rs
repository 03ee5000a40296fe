//! Structured LLM client (C2): a stateless `call(schema_name, inputs)` wrapper
//! over a fallback chain of providers (`opus`/`haiku` via Anthropic's HTTP
//! API, `ollama-local`, and a `claude-cli` subprocess fallback).

mod backends;
mod client;
mod types;

pub use backends::{AnthropicHttpBackend, ClaudeCliBackend, OllamaBackend};
pub use client::{StructuredClient, DEFAULT_TIMEOUT};
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use autoplan_config::{LlmBackendKind, LlmConfig};
use autoplan_utils::error::LlmError;
use autoplan_utils::runner::NativeRunner;
use std::sync::Arc;

/// Model identifier used for a given backend kind when the caller doesn't
/// override `LlmInvocation::model`.
fn default_model_for(kind: &LlmBackendKind) -> &'static str {
    match kind {
        LlmBackendKind::Opus => "claude-opus",
        LlmBackendKind::Haiku => "claude-haiku",
        LlmBackendKind::OllamaLocal => "llama3",
        LlmBackendKind::ClaudeCli => "claude-cli",
    }
}

fn build_backend(kind: &LlmBackendKind, config: &LlmConfig) -> Option<Box<dyn LlmBackend>> {
    match kind {
        LlmBackendKind::Opus | LlmBackendKind::Haiku => {
            match AnthropicHttpBackend::new(
                &config.anthropic_api_key_env,
                None,
                default_model_for(kind),
                config.max_tokens,
                config.temperature,
            ) {
                Ok(backend) => Some(Box::new(backend)),
                Err(e) => {
                    tracing::warn!(backend = ?kind, error = %e, "skipping LLM backend in fallback chain");
                    None
                }
            }
        }
        LlmBackendKind::OllamaLocal => Some(Box::new(OllamaBackend::new(
            Some(config.ollama_endpoint.clone()),
            default_model_for(kind),
        ))),
        LlmBackendKind::ClaudeCli => match ClaudeCliBackend::discover_binary() {
            Ok(binary) => Some(Box::new(ClaudeCliBackend::new(binary, Arc::new(NativeRunner)))),
            Err(e) => {
                tracing::warn!(error = %e, "claude CLI fallback unavailable");
                None
            }
        },
    }
}

/// Build a [`StructuredClient`] whose fallback chain is `[config.backend] ++
/// config.fallback_chain`, deduplicated, skipping backends that fail to
/// construct (missing API key, missing binary).
///
/// # Errors
/// Returns `LlmError::Misconfiguration` if no backend in the chain could be
/// constructed.
pub fn from_config(config: &LlmConfig) -> Result<StructuredClient, LlmError> {
    let mut order = vec![config.backend.clone()];
    for kind in &config.fallback_chain {
        if !order.contains(kind) {
            order.push(kind.clone());
        }
    }

    let backends: Vec<Box<dyn LlmBackend>> = order
        .iter()
        .filter_map(|kind| build_backend(kind, config))
        .collect();

    if backends.is_empty() {
        return Err(LlmError::Misconfiguration {
            backend: "all".to_string(),
            reason: "no configured LLM backend could be constructed".to_string(),
        });
    }

    Ok(StructuredClient::new(backends))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_falls_back_to_claude_cli_when_no_api_key_and_no_binary() {
        let env_var = "AUTOPLAN_TEST_NO_SUCH_ANTHROPIC_KEY";
        unsafe {
            std::env::remove_var(env_var);
        }
        let mut config = LlmConfig {
            anthropic_api_key_env: env_var.to_string(),
            ..LlmConfig::default()
        };
        config.backend = LlmBackendKind::Haiku;
        config.fallback_chain = vec![LlmBackendKind::OllamaLocal];

        // Ollama backend always constructs (no env/binary dependency), so the
        // chain should still succeed even though Haiku fails.
        let client = from_config(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn default_model_names_are_non_empty() {
        for kind in [
            LlmBackendKind::Opus,
            LlmBackendKind::Haiku,
            LlmBackendKind::OllamaLocal,
            LlmBackendKind::ClaudeCli,
        ] {
            assert!(!default_model_for(&kind).is_empty());
        }
    }
}
