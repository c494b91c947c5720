use std::sync::Arc;

use pickwise_core::domain::product::Product;
use pickwise_core::errors::BILLING_REMEDIATION;
use pickwise_core::scoring::{self, ScoredProduct};
use serde::Serialize;
use tracing::warn;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::{PromptLibrary, PromptProduct};
use crate::runtime::GenerationSettings;

/// Catalog entries quoted to the model as background.
pub const CATALOG_EXCERPT_LIMIT: usize = 50;
const EXPLANATION_MAX_TOKENS: u32 = 512;
const EXPLANATION_TEMPERATURE: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    Model,
    RuleBased,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
    pub notice: Option<String>,
}

/// Explains a ranked recommendation list, through the model when it answers
/// and from the matched scoring signals when it does not.
pub struct Explainer {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    settings: GenerationSettings,
}

impl Explainer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        settings: GenerationSettings,
    ) -> Self {
        Self { client, prompts, settings }
    }

    pub async fn explain(
        &self,
        catalog: &[Product],
        behavior: &serde_json::Value,
        recommended: &[ScoredProduct],
    ) -> Explanation {
        match self.generate(catalog, behavior, recommended).await {
            Ok(text) => Explanation { text, source: ExplanationSource::Model, notice: None },
            Err(error) => {
                warn!(
                    event_name = "recommend.explanation.fallback",
                    billing = error.is_billing(),
                    error = %error,
                    "model explanation unavailable, using rule-based explanation"
                );
                rule_based(recommended, &error)
            }
        }
    }

    async fn generate(
        &self,
        catalog: &[Product],
        behavior: &serde_json::Value,
        recommended: &[ScoredProduct],
    ) -> Result<String, LlmError> {
        let excerpt: Vec<PromptProduct> = catalog
            .iter()
            .take(CATALOG_EXCERPT_LIMIT)
            .map(|product| prompt_product(product, 0))
            .collect();
        let top: Vec<PromptProduct> = recommended
            .iter()
            .map(|scored| prompt_product(&scored.product, scored.score))
            .collect();

        let request = CompletionRequest {
            messages: self.prompts.explanation(&excerpt, behavior, &top)?,
            max_tokens: self.settings.max_tokens.min(EXPLANATION_MAX_TOKENS),
            temperature: EXPLANATION_TEMPERATURE,
        };
        self.client.complete(&request).await
    }
}

fn prompt_product(product: &Product, score: u32) -> PromptProduct {
    PromptProduct {
        id: product.id.to_string(),
        title: product.title.clone(),
        category: product.category.clone(),
        price: product.price.to_string(),
        score,
    }
}

fn rule_based(recommended: &[ScoredProduct], error: &LlmError) -> Explanation {
    let lines = scoring::explain(recommended);
    if error.is_billing() {
        return Explanation {
            text: format!("LLM unavailable (billing). Fallback explanations:\n\n{lines}"),
            source: ExplanationSource::RuleBased,
            notice: Some(BILLING_REMEDIATION.to_string()),
        };
    }

    Explanation { text: lines, source: ExplanationSource::RuleBased, notice: None }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use pickwise_core::domain::behavior::UserBehaviorProfile;
    use pickwise_core::domain::product::{Product, ProductId};
    use pickwise_core::scoring::score_and_rank;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{ExplanationSource, Explainer};
    use crate::llm::{CompletionRequest, DisabledClient, LlmClient, LlmError};
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

    fn explainer(client: Arc<dyn LlmClient>) -> Explainer {
        Explainer::new(
            client,
            Arc::new(PromptLibrary::new().expect("templates compile")),
            GenerationSettings::default(),
        )
    }

    fn catalog() -> Vec<Product> {
        vec![Product {
            id: ProductId("1".to_string()),
            title: "Road Shoe".to_string(),
            description: "Cushioned".to_string(),
            category: "footwear".to_string(),
            price: Decimal::new(80, 0),
            tags: vec!["running".to_string()],
            stock: 5,
            sku: "FOO-1".to_string(),
            metadata: json!({}),
            created_at: Utc::now(),
        }]
    }

    #[tokio::test]
    async fn model_text_is_used_when_available() {
        let behavior = json!({"preferences": {"categories": ["footwear"]}});
        let profile = UserBehaviorProfile::from_value(&behavior).expect("profile");
        let ranked = score_and_rank(&catalog(), &profile, 3);

        let explanation = explainer(Arc::new(Fixed(Ok("Because you like shoes.".to_string()))))
            .explain(&catalog(), &behavior, &ranked)
            .await;

        assert_eq!(explanation.source, ExplanationSource::Model);
        assert_eq!(explanation.text, "Because you like shoes.");
        assert_eq!(explanation.notice, None);
    }

    #[tokio::test]
    async fn billing_failure_yields_rule_based_text_with_notice() {
        let behavior = json!({"preferences": {"categories": ["footwear"], "maxPrice": 100}});
        let profile = UserBehaviorProfile::from_value(&behavior).expect("profile");
        let ranked = score_and_rank(&catalog(), &profile, 3);

        let explanation =
            explainer(Arc::new(Fixed(Err(LlmError::Billing("no credits".to_string())))))
                .explain(&catalog(), &behavior, &ranked)
                .await;

        assert_eq!(explanation.source, ExplanationSource::RuleBased);
        assert_eq!(
            explanation.text,
            "LLM unavailable (billing). Fallback explanations:\n\n\
             - Road Shoe: category match: footwear; within budget: $80"
        );
        assert!(explanation.notice.is_some_and(|notice| notice.contains("credits")));
    }

    #[tokio::test]
    async fn disabled_backend_degrades_without_notice() {
        let behavior = json!({});
        let ranked = score_and_rank(&catalog(), &UserBehaviorProfile::default(), 3);

        let explanation =
            explainer(Arc::new(DisabledClient)).explain(&catalog(), &behavior, &ranked).await;

        assert_eq!(explanation.source, ExplanationSource::RuleBased);
        assert_eq!(explanation.text, "- Road Shoe: Recommended based on matching attributes.");
        assert_eq!(explanation.notice, None);
    }
}
