//! OpenRouter-compatible chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

/// One model behind one chat-completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    pub fn http_client(timeout: Duration) -> Result<Client, LlmError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::Transport(format!("could not build HTTP client: {error}")))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;
        let payload: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(error) = payload.as_ref().and_then(|value| value.get("error")) {
            return Err(classify_error_body(status, error));
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(LlmError::Billing(text));
        }
        if !status.is_success() {
            return Err(LlmError::Status { status: status.as_u16(), message: text });
        }

        let payload = payload
            .ok_or_else(|| LlmError::InvalidResponse("response body is not JSON".to_string()))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LlmError::InvalidResponse("missing choices[0].message.content".to_string())
            })?;

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!(
            event_name = "llm.completion.received",
            model = %self.model,
            chars = content.len(),
            "completion received"
        );
        Ok(content.to_string())
    }
}

fn classify_transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(error.to_string())
    } else {
        LlmError::Transport(error.to_string())
    }
}

/// Billing failures arrive either as HTTP 402 or as an error body whose
/// `code` is 402, sometimes on a 200 response.
fn classify_error_body(status: StatusCode, error: &Value) -> LlmError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    let code = error.get("code").and_then(|code| {
        code.as_u64().or_else(|| code.as_str().and_then(|text| text.parse::<u64>().ok()))
    });

    if code == Some(402) || status == StatusCode::PAYMENT_REQUIRED {
        return LlmError::Billing(message);
    }

    let status = if status.is_success() {
        code.and_then(|code| u16::try_from(code).ok()).filter(|code| *code >= 400).unwrap_or(502)
    } else {
        status.as_u16()
    };
    LlmError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::classify_error_body;
    use crate::llm::LlmError;

    #[test]
    fn error_code_402_is_billing_even_on_success_status() {
        let error = classify_error_body(
            StatusCode::OK,
            &json!({"code": 402, "message": "Insufficient credits"}),
        );
        assert_eq!(error, LlmError::Billing("Insufficient credits".to_string()));
    }

    #[test]
    fn other_error_bodies_keep_http_status() {
        let error = classify_error_body(
            StatusCode::UNAUTHORIZED,
            &json!({"code": 401, "message": "No auth credentials found"}),
        );
        assert_eq!(
            error,
            LlmError::Status { status: 401, message: "No auth credentials found".to_string() }
        );
    }
}
