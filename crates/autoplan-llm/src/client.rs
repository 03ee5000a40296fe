//! Structured call wrapper: retry/backoff, JSON extraction, and the
//! provider fallback chain.

use autoplan_utils::error::LlmError;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

/// Exponential backoff schedule for transport failures: four attempts
/// total, waiting 0.5s, 1.5s, then 4.5s between them.
const RETRY_BACKOFF: [Duration; 3] = [
    Duration::from_millis(500),
    Duration::from_millis(1500),
    Duration::from_millis(4500),
];
const MAX_TRANSPORT_ATTEMPTS: u32 = 4;

/// Default per-call timeout, used when a caller doesn't
/// override it for a specific schema.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Stateless structured-LLM client: drives a fallback chain of backends,
/// each tried in order, with transport retry and a single parse-failure
/// cleaning retry per backend.
pub struct StructuredClient {
    backends: Vec<Box<dyn LlmBackend>>,
}

impl StructuredClient {
    #[must_use]
    pub fn new(backends: Vec<Box<dyn LlmBackend>>) -> Self {
        Self { backends }
    }

    /// `call(schema_name, inputs) -> Result<T, LlmError>`.
    ///
    /// `inputs` becomes the sole user message; `schema_description` is
    /// appended so the backend knows the expected output shape.
    ///
    /// # Errors
    /// Returns `LlmError::AllBackendsFailed` if every backend in the chain
    /// fails (transport exhaustion or schema violation after the cleaning
    /// retry).
    pub async fn call<T: DeserializeOwned>(
        &self,
        schema_name: &str,
        model: &str,
        schema_description: &str,
        inputs: &str,
        timeout: Duration,
    ) -> Result<T, LlmError> {
        if self.backends.is_empty() {
            return Err(LlmError::Misconfiguration {
                backend: "none".to_string(),
                reason: "no LLM backend configured".to_string(),
            });
        }

        let messages = vec![
            Message::system(format!(
                "Respond with JSON only, matching this schema:\n{schema_description}"
            )),
            Message::user(inputs.to_string()),
        ];

        let mut last_error: Option<LlmError> = None;
        for backend in &self.backends {
            let inv = LlmInvocation::new(schema_name, model, timeout, messages.clone());
            match self.call_one_backend::<T>(backend.as_ref(), inv).await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }

        Err(LlmError::AllBackendsFailed {
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no backends configured".to_string()),
        })
    }

    async fn call_one_backend<T: DeserializeOwned>(
        &self,
        backend: &dyn LlmBackend,
        inv: LlmInvocation,
    ) -> Result<T, LlmError> {
        let result = self.invoke_with_retry(backend, &inv).await?;

        match parse_structured_response::<T>(&result.raw_response) {
            Ok(value) => Ok(value),
            Err(parse_err) => {
                // One cleaning retry: ask the same backend to return only JSON.
                let mut cleaned_inv = inv.clone();
                cleaned_inv.messages.push(Message::assistant(result.raw_response.clone()));
                cleaned_inv.messages.push(Message::user(
                    "That response was not valid JSON matching the schema. \
                     Return only the corrected JSON object, with no prose or code fences."
                        .to_string(),
                ));

                let retried = self.invoke_with_retry(backend, &cleaned_inv).await?;
                parse_structured_response::<T>(&retried.raw_response).map_err(|_| {
                    LlmError::SchemaValidationFailed {
                        attempts: 2,
                        reason: parse_err,
                    }
                })
            }
        }
    }

    async fn invoke_with_retry(
        &self,
        backend: &dyn LlmBackend,
        inv: &LlmInvocation,
    ) -> Result<LlmResult, LlmError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match backend.invoke(inv).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < MAX_TRANSPORT_ATTEMPTS && is_retryable(&e) => {
                    tokio::time::sleep(RETRY_BACKOFF[(attempt - 1) as usize]).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_retryable(err: &LlmError) -> bool {
    matches!(
        err,
        LlmError::Transport { .. } | LlmError::ProviderQuota { .. }
    )
}

/// Strip common wrappers (code fences) and extract the JSON substring
/// bounded by the first `{` and last `}`, then parse it as `T`.
fn parse_structured_response<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let candidate = extract_json_substring(raw).ok_or_else(|| {
        "response did not contain a JSON object".to_string()
    })?;
    serde_json::from_str(candidate).map_err(|e| e.to_string())
}

fn extract_json_substring(raw: &str) -> Option<&str> {
    let stripped = strip_code_fences(raw);
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&stripped[start..=end])
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    }
}
