use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::llm::{CompletionRequest, LlmClient, LlmError};

/// Tries each backend in priority order; the first completion wins.
///
/// When every backend fails the error reported is a billing failure if any
/// backend hit one, otherwise the last backend's error.
#[derive(Clone)]
pub struct FallbackClient {
    backends: Vec<Arc<dyn LlmClient>>,
}

impl FallbackClient {
    pub fn new(backends: Vec<Arc<dyn LlmClient>>) -> Self {
        Self { backends }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl LlmClient for FallbackClient {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut billing: Option<LlmError> = None;
        let mut last: Option<LlmError> = None;

        for backend in &self.backends {
            match backend.complete(request).await {
                Ok(content) => return Ok(content),
                Err(error) => {
                    warn!(
                        event_name = "llm.backend.failed",
                        backend = backend.name(),
                        billing = error.is_billing(),
                        error = %error,
                        "backend failed, trying next"
                    );
                    if error.is_billing() && billing.is_none() {
                        billing = Some(error.clone());
                    }
                    last = Some(error);
                }
            }
        }

        Err(billing.or(last).unwrap_or(LlmError::Disabled))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::FallbackClient;
    use crate::llm::{CompletionRequest, LlmClient, LlmError};

    struct Scripted {
        name: &'static str,
        result: Result<String, LlmError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmClient for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn scripted(
        name: &'static str,
        result: Result<String, LlmError>,
        calls: &Arc<AtomicUsize>,
    ) -> Arc<dyn LlmClient> {
        Arc::new(Scripted { name, result, calls: calls.clone() })
    }

    fn request() -> CompletionRequest {
        CompletionRequest { messages: Vec::new(), max_tokens: 16, temperature: 0.0 }
    }

    #[tokio::test]
    async fn first_success_wins_and_later_backends_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FallbackClient::new(vec![
            scripted("a", Err(LlmError::Timeout("slow".to_string())), &calls),
            scripted("b", Ok("answer".to_string()), &calls),
            scripted("c", Ok("unused".to_string()), &calls),
        ]);

        assert_eq!(client.complete(&request()).await, Ok("answer".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn billing_failure_is_reported_over_later_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FallbackClient::new(vec![
            scripted("a", Err(LlmError::Billing("no credits".to_string())), &calls),
            scripted("b", Err(LlmError::Transport("refused".to_string())), &calls),
        ]);

        assert_eq!(
            client.complete(&request()).await,
            Err(LlmError::Billing("no credits".to_string()))
        );
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error_and_empty_list_is_disabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FallbackClient::new(vec![
            scripted("a", Err(LlmError::Timeout("slow".to_string())), &calls),
            scripted("b", Err(LlmError::EmptyResponse), &calls),
        ]);

        assert_eq!(client.complete(&request()).await, Err(LlmError::EmptyResponse));
        assert_eq!(
            FallbackClient::new(Vec::new()).complete(&request()).await,
            Err(LlmError::Disabled)
        );
    }
}
