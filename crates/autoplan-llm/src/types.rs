//! Core types for the LLM backend abstraction (C2).

use async_trait::async_trait;
use autoplan_utils::error::LlmError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to a single backend invocation.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Name of the declared response schema this call must satisfy, used only
    /// for error messages and tracing; schema validation itself happens in
    /// `StructuredClient::call`, not here.
    pub schema_name: String,
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        schema_name: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Result from a single backend invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// A single LLM provider. All backends (HTTP or subprocess) implement this so
/// the structured client can drive any of them through a fallback chain
/// without knowing provider details.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Provider name used in error messages and `LlmResult::provider`.
    fn name(&self) -> &str;

    /// Invoke the backend with the given messages.
    ///
    /// # Errors
    /// Returns `LlmError` for transport failures, auth/quota rejection, or
    /// timeouts. Never panics.
    async fn invoke(&self, inv: &LlmInvocation) -> Result<LlmResult, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_builders_set_expected_roles() {
        assert_eq!(Message::system("a").role, Role::System);
        assert_eq!(Message::user("a").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn invocation_metadata_is_retrievable() {
        let inv = LlmInvocation::new("schema", "haiku", Duration::from_secs(1), vec![])
            .with_metadata("temperature", serde_json::json!(0.2));
        assert_eq!(inv.metadata.get("temperature"), Some(&serde_json::json!(0.2)));
    }
}
