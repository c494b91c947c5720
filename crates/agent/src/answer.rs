use std::sync::Arc;

use pickwise_core::extraction::structured::{truncate_context, MODEL_CONTEXT_LIMIT};
use pickwise_core::snippets::{find_snippets, SnippetMatch};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::PromptLibrary;
use crate::runtime::GenerationSettings;

pub const TRUNCATION_MARKER: &str = "\n[Content truncated...]";
const BILLING_DETAILS: &str = "Insufficient credits on the OpenRouter/OpenAI account. Purchase \
credits at https://openrouter.ai/settings/credits or use a different API key.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer: String,
    pub context_length: usize,
    pub query_length: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AskError {
    #[error("Query cannot be empty")]
    EmptyQuery,
    #[error("No PDF content available. Please upload a PDF file first.")]
    NoDocument,
    /// Billing exhaustion, with whatever the document itself says about the query.
    #[error("LLM service billing/credits error")]
    Billing { details: String, snippets: Option<SnippetMatch> },
    #[error("{}", .0.user_message())]
    Service(LlmError),
}

/// Document text as submitted to the model: at most the context limit, with a
/// marker when it was cut.
pub fn question_context(document: &str) -> String {
    let excerpt = truncate_context(document, MODEL_CONTEXT_LIMIT);
    if excerpt.len() < document.len() {
        format!("{excerpt}{TRUNCATION_MARKER}")
    } else {
        excerpt.to_string()
    }
}

/// Answers free-text questions against the last uploaded document.
pub struct Answerer {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    settings: GenerationSettings,
}

impl Answerer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        settings: GenerationSettings,
    ) -> Self {
        Self { client, prompts, settings }
    }

    pub async fn ask(&self, document: &str, query: &str) -> Result<Answer, AskError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AskError::EmptyQuery);
        }
        if document.trim().is_empty() {
            return Err(AskError::NoDocument);
        }

        let context = question_context(document);
        let request = CompletionRequest {
            messages: self.prompts.question(&context, query).map_err(AskError::Service)?,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        match self.client.complete(&request).await {
            Ok(answer) => {
                info!(
                    event_name = "ask.answered",
                    context_chars = context.chars().count(),
                    answer_chars = answer.chars().count(),
                    "question answered"
                );
                Ok(Answer {
                    answer,
                    context_length: context.chars().count(),
                    query_length: query.chars().count(),
                })
            }
            Err(LlmError::Billing(message)) => {
                let snippets = find_snippets(document, query);
                warn!(
                    event_name = "ask.billing_fallback",
                    snippet_hits = snippets.as_ref().map_or(0, |found| found.snippets().len()),
                    error = %message,
                    "billing exhausted, answering from document snippets"
                );
                let details = snippets
                    .as_ref()
                    .map(|found| format!("LLM unavailable (billing). {}", found.summary()))
                    .unwrap_or_else(|| BILLING_DETAILS.to_string());
                Err(AskError::Billing { details, snippets })
            }
            Err(error) => {
                warn!(event_name = "ask.failed", error = %error, "question could not be answered");
                Err(AskError::Service(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{question_context, Answerer, AskError, TRUNCATION_MARKER};
    use crate::llm::{CompletionRequest, LlmClient, LlmError};
    use crate::prompts::PromptLibrary;
    use crate::runtime::GenerationSettings;

    struct Fixed(Result<String, LlmError>);

    #[async_trait]
    impl LlmClient for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            self.0.clone()
        }
    }

    fn answerer(reply: Result<String, LlmError>) -> Answerer {
        Answerer::new(
            Arc::new(Fixed(reply)),
            Arc::new(PromptLibrary::new().expect("templates compile")),
            GenerationSettings::default(),
        )
    }

    const DOCUMENT: &str = "The Hiking Boot is waterproof. The Road Shoe is light.";

    #[tokio::test]
    async fn answer_reports_context_and_query_lengths() {
        let answer = answerer(Ok("Try the Hiking Boot.".to_string()))
            .ask(DOCUMENT, " Which is waterproof? ")
            .await
            .expect("answered");

        assert_eq!(answer.answer, "Try the Hiking Boot.");
        assert_eq!(answer.context_length, DOCUMENT.len());
        assert_eq!(answer.query_length, "Which is waterproof?".len());
    }

    #[tokio::test]
    async fn blank_query_and_missing_document_are_rejected() {
        let answerer = answerer(Ok("unused".to_string()));

        assert_eq!(answerer.ask(DOCUMENT, "  ").await, Err(AskError::EmptyQuery));
        assert_eq!(answerer.ask("", "boots?").await, Err(AskError::NoDocument));
    }

    #[tokio::test]
    async fn billing_failure_falls_back_to_document_snippets() {
        let error = answerer(Err(LlmError::Billing("402".to_string())))
            .ask(DOCUMENT, "waterproof boot")
            .await
            .expect_err("billing");

        let AskError::Billing { details, snippets } = error else {
            panic!("expected billing failure");
        };
        assert!(details.starts_with("LLM unavailable (billing). Showing relevant snippets"));
        assert_eq!(
            snippets.map(|found| found.snippets().to_vec()),
            Some(vec!["The Hiking Boot is waterproof.".to_string()])
        );
    }

    #[tokio::test]
    async fn billing_failure_without_hits_returns_generic_details() {
        let error = answerer(Err(LlmError::Billing("402".to_string())))
            .ask(DOCUMENT, "kayak")
            .await
            .expect_err("billing");

        assert!(matches!(error, AskError::Billing { snippets: None, ref details } if details.contains("Purchase credits")));
    }

    #[tokio::test]
    async fn other_failures_carry_specific_messages() {
        let error = answerer(Err(LlmError::Timeout("30s".to_string())))
            .ask(DOCUMENT, "boots?")
            .await
            .expect_err("timeout");

        assert_eq!(error.to_string(), "Request timed out. Please try again.");
    }

    #[test]
    fn long_documents_are_truncated_with_marker() {
        let document = "a".repeat(9000);
        let context = question_context(&document);

        assert!(context.ends_with(TRUNCATION_MARKER));
        assert_eq!(context.len(), 8000 + TRUNCATION_MARKER.len());
        assert_eq!(question_context("short"), "short");
    }
}
