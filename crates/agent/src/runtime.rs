use std::sync::Arc;
use std::time::Duration;

use pickwise_core::config::LlmConfig;
use pickwise_core::extraction::ExtractorChain;
use tracing::info;

use crate::answer::Answerer;
use crate::explain::Explainer;
use crate::extraction::ModelExtractionStrategy;
use crate::fallback::FallbackClient;
use crate::llm::{DisabledClient, LlmClient, LlmError};
use crate::openrouter::OpenRouterClient;
use crate::prompts::PromptLibrary;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { max_tokens: 1024, temperature: 0.3 }
    }
}

/// Owns the generative collaborator and hands out the components that use it.
#[derive(Clone)]
pub struct AgentRuntime {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    settings: GenerationSettings,
    enabled: bool,
}

impl AgentRuntime {
    pub fn new(client: Arc<dyn LlmClient>, settings: GenerationSettings) -> Result<Self, LlmError> {
        Ok(Self { client, prompts: Arc::new(PromptLibrary::new()?), settings, enabled: true })
    }

    /// A runtime whose every generative call degrades deterministically.
    pub fn disabled() -> Result<Self, LlmError> {
        Ok(Self {
            client: Arc::new(DisabledClient),
            prompts: Arc::new(PromptLibrary::new()?),
            settings: GenerationSettings::default(),
            enabled: false,
        })
    }

    /// One backend per configured model, tried in order. Without an API key
    /// the runtime is disabled.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let Some(api_key) = config.api_key.clone().filter(|_| config.is_enabled()) else {
            info!(event_name = "agent.disabled", "no llm api key configured");
            return Self::disabled();
        };

        let http = OpenRouterClient::http_client(Duration::from_secs(config.timeout_secs))?;
        let backends: Vec<Arc<dyn LlmClient>> = config
            .models
            .iter()
            .map(|model| {
                Arc::new(OpenRouterClient::new(
                    http.clone(),
                    config.base_url.clone(),
                    api_key.clone(),
                    model.clone(),
                )) as Arc<dyn LlmClient>
            })
            .collect();

        info!(
            event_name = "agent.configured",
            backends = backends.len(),
            base_url = %config.base_url,
            "llm backends configured"
        );
        Self::new(
            Arc::new(FallbackClient::new(backends)),
            GenerationSettings { max_tokens: config.max_tokens, temperature: config.temperature },
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn client(&self) -> Arc<dyn LlmClient> {
        self.client.clone()
    }

    /// Pattern, model and heuristic strategies; the model stage is left out
    /// when generation is disabled.
    pub fn extraction_chain(&self) -> ExtractorChain {
        if !self.enabled {
            return ExtractorChain::deterministic();
        }
        ExtractorChain::with_model(Box::new(ModelExtractionStrategy::new(
            self.client.clone(),
            self.prompts.clone(),
            self.settings,
        )))
    }

    pub fn explainer(&self) -> Explainer {
        Explainer::new(self.client.clone(), self.prompts.clone(), self.settings)
    }

    pub fn answerer(&self) -> Answerer {
        Answerer::new(self.client.clone(), self.prompts.clone(), self.settings)
    }
}
