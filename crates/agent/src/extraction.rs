use std::sync::Arc;

use async_trait::async_trait;
use pickwise_core::errors::ExternalServiceError;
use pickwise_core::extraction::structured::{
    parse_model_output, truncate_context, MAX_MODEL_RECORDS, MODEL_CONTEXT_LIMIT,
};
use pickwise_core::extraction::{CandidateProduct, ExtractionStrategy, StrategyKind};
use tracing::info;

use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLibrary;
use crate::runtime::GenerationSettings;

/// Strategy B: asks the model for a bounded JSON list of products built from
/// a prefix of the document text.
pub struct ModelExtractionStrategy {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    settings: GenerationSettings,
}

impl ModelExtractionStrategy {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        settings: GenerationSettings,
    ) -> Self {
        Self { client, prompts, settings }
    }
}

#[async_trait]
impl ExtractionStrategy for ModelExtractionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Model
    }

    async fn try_extract(
        &self,
        text: &str,
    ) -> Result<Option<Vec<CandidateProduct>>, ExternalServiceError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let excerpt = truncate_context(text, MODEL_CONTEXT_LIMIT);
        let messages = self.prompts.extraction(excerpt, MAX_MODEL_RECORDS)?;
        let request = CompletionRequest {
            messages,
            max_tokens: self.settings.max_tokens,
            // Extraction wants repeatable output regardless of the chat temperature.
            temperature: 0.0,
        };

        let raw = self.client.complete(&request).await?;
        let candidates = parse_model_output(&raw)?;

        info!(
            event_name = "extraction.model.parsed",
            backend = self.client.name(),
            excerpt_chars = excerpt.chars().count(),
            candidates = candidates.len(),
            "model extraction reply parsed"
        );
        Ok(Some(candidates))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pickwise_core::errors::ExternalServiceError;
    use pickwise_core::extraction::{ExtractionStrategy, ExtractorChain, StrategyKind};

    use super::ModelExtractionStrategy;
    use crate::llm::{CompletionRequest, LlmClient, LlmError};
    use crate::prompts::PromptLibrary;
    use crate::runtime::GenerationSettings;

    struct Recording {
        reply: Result<String, LlmError>,
        calls: AtomicUsize,
        last_user_message: Mutex<String>,
    }

    impl Recording {
        fn new(reply: Result<String, LlmError>) -> Arc<Self> {
            Arc::new(Self { reply, calls: AtomicUsize::new(0), last_user_message: Mutex::default() })
        }
    }

    #[async_trait]
    impl LlmClient for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let (Ok(mut slot), Some(message)) =
                (self.last_user_message.lock(), request.messages.last())
            {
                *slot = message.content.clone();
            }
            self.reply.clone()
        }
    }

    fn strategy(client: Arc<Recording>) -> ModelExtractionStrategy {
        ModelExtractionStrategy::new(
            client,
            Arc::new(PromptLibrary::new().expect("templates compile")),
            GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_model() {
        let client = Recording::new(Ok("[]".to_string()));
        let result = strategy(client.clone()).try_extract("  \n ").await;

        assert_eq!(result, Ok(None));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn only_a_bounded_prefix_is_submitted() {
        let client = Recording::new(Ok(r#"[{"title": "Lamp", "price": 12}]"#.to_string()));
        let text = "x".repeat(20_000);

        let candidates = strategy(client.clone())
            .try_extract(&text)
            .await
            .expect("reply parses")
            .expect("candidates present");

        assert_eq!(candidates.len(), 1);
        let submitted = client.last_user_message.lock().expect("lock").clone();
        let excerpt = submitted.trim_start_matches("Catalog text:\n");
        assert_eq!(excerpt.len(), 8000);
    }

    #[tokio::test]
    async fn prose_reply_is_malformed_and_chain_falls_through() {
        let client = Recording::new(Ok("Sorry, I cannot help with that.".to_string()));
        let model = strategy(client.clone());

        assert!(matches!(
            model.try_extract("Leather Wallet $45.00").await,
            Err(ExternalServiceError::MalformedResponse(_))
        ));

        let chain = ExtractorChain::with_model(Box::new(strategy(client)));
        let outcome = chain.extract("Leather Wallet $45.00\nHand stitched").await;
        assert_eq!(outcome.strategy, Some(StrategyKind::Heuristic));
        assert_eq!(outcome.failures.len(), 1);
    }

    #[tokio::test]
    async fn billing_errors_surface_as_billing_exhausted() {
        let client = Recording::new(Err(LlmError::Billing("credits".to_string())));
        let result = strategy(client).try_extract("Some unstructured catalog").await;

        assert!(matches!(result, Err(ExternalServiceError::BillingExhausted(_))));
    }
}
