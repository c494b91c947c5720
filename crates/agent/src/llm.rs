use async_trait::async_trait;
use pickwise_core::errors::ExternalServiceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Model-agnostic chat completion input; the backend supplies the model id.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("no language model backend is configured")]
    Disabled,
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("billing or credit failure: {0}")]
    Billing(String),
    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend returned an empty completion")]
    EmptyResponse,
    #[error("backend response had an unexpected shape: {0}")]
    InvalidResponse(String),
    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}

impl LlmError {
    pub fn is_billing(&self) -> bool {
        matches!(self, Self::Billing(_))
    }

    /// Human-readable cause for callers that surface the failure directly.
    pub fn user_message(&self) -> String {
        match self {
            Self::Disabled => {
                "AI service is not configured. Set PICKWISE_LLM_API_KEY to enable it.".to_string()
            }
            Self::Timeout(_) => "Request timed out. Please try again.".to_string(),
            Self::Status { status: 401 | 403, .. } => {
                "AI service authentication failed. Please check API configuration.".to_string()
            }
            Self::Status { status: 429, .. } => {
                "Too many requests. Please wait a moment before trying again.".to_string()
            }
            Self::Status { status: 413, .. } => {
                "Request payload too large. Try with a shorter question or smaller document."
                    .to_string()
            }
            Self::Status { message, .. } => format!("AI service error: {message}"),
            Self::EmptyResponse => {
                "AI service returned an empty response. Please try again.".to_string()
            }
            Self::Billing(_) | Self::Transport(_) | Self::InvalidResponse(_) | Self::Prompt(_) => {
                "Failed to get response from AI service".to_string()
            }
        }
    }
}

impl From<LlmError> for ExternalServiceError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Billing(message) => Self::BillingExhausted(message),
            LlmError::EmptyResponse | LlmError::InvalidResponse(_) => {
                Self::MalformedResponse(error.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Identifies the backend in logs, e.g. the model id.
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Stands in when no API key is configured; every call fails with
/// [`LlmError::Disabled`] so callers take their deterministic path.
#[derive(Clone, Debug, Default)]
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}
