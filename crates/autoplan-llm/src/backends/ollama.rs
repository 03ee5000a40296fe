//! Local Ollama backend (C2) — used for the `ollama-local` configuration.

use async_trait::async_trait;
use autoplan_utils::error::LlmError;
use serde::{Deserialize, Serialize};

use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/chat";

pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    default_model: String,
}

impl OllamaBackend {
    #[must_use]
    pub fn new(endpoint: Option<String>, default_model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            default_model: default_model.into(),
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama-local"
    }

    async fn invoke(&self, inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let body = OllamaRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(inv.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        backend: "ollama-local".to_string(),
                        timeout_seconds: inv.timeout.as_secs(),
                    }
                } else {
                    LlmError::Transport {
                        backend: "ollama-local".to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(LlmError::Transport {
                backend: "ollama-local".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let parsed: OllamaResponse = response.json().await.map_err(|e| LlmError::Transport {
            backend: "ollama-local".to_string(),
            reason: format!("invalid response body: {e}"),
        })?;

        Ok(LlmResult::new(parsed.message.content, "ollama-local", model))
    }
}

#[derive(Debug, Clone, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_local_ollama() {
        let backend = OllamaBackend::new(None, "llama3");
        assert_eq!(backend.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn convert_messages_preserves_order_and_roles() {
        let messages = vec![Message::system("s"), Message::user("u")];
        let converted = OllamaBackend::convert_messages(&messages);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }
}
