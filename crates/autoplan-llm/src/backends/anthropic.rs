//! Anthropic Messages API backend (C2).

use async_trait::async_trait;
use autoplan_utils::error::LlmError;
use serde::{Deserialize, Serialize};

use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicHttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicHttpBackend {
    /// # Errors
    /// Returns `LlmError::Misconfiguration` if the named environment
    /// variable holding the API key is not set.
    pub fn new(
        api_key_env: &str,
        base_url: Option<String>,
        default_model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, LlmError> {
        let api_key = std::env::var(api_key_env).map_err(|_| LlmError::Misconfiguration {
            backend: "anthropic".to_string(),
            reason: format!("environment variable '{api_key_env}' is not set"),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model: default_model.into(),
            max_tokens,
            temperature,
        })
    }

    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut out = Vec::new();
        for msg in messages {
            match msg.role {
                Role::System => {
                    if let Some(existing) = system_prompt.as_mut() {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    } else {
                        system_prompt = Some(msg.content.clone());
                    }
                }
                Role::User => out.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
                Role::Assistant => out.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }
        (system_prompt, out)
    }
}

#[async_trait]
impl LlmBackend for AnthropicHttpBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, inv: &LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let (system, messages) = Self::convert_messages(&inv.messages);

        let body = AnthropicRequest {
            model: model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .timeout(inv.timeout);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    backend: "anthropic".to_string(),
                    timeout_seconds: inv.timeout.as_secs(),
                }
            } else {
                LlmError::Transport {
                    backend: "anthropic".to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(LlmError::ProviderAuth {
                backend: "anthropic".to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::ProviderQuota {
                backend: "anthropic".to_string(),
            });
        }
        if !status.is_success() {
            return Err(LlmError::Transport {
                backend: "anthropic".to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|e| LlmError::Transport {
            backend: "anthropic".to_string(),
            reason: format!("invalid response body: {e}"),
        })?;

        let content: String = parsed
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect();

        if content.is_empty() {
            return Err(LlmError::Transport {
                backend: "anthropic".to_string(),
                reason: "response had no text content".to_string(),
            });
        }

        let mut result = LlmResult::new(content, "anthropic", model);
        if let Some(usage) = parsed.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
