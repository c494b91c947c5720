//! Prompt templates for the three generative tasks.

use serde::Serialize;
use tera::{Context, Tera};

use crate::llm::{ChatMessage, LlmError};

const EXTRACT_SYSTEM: &str = "You extract product records from catalog text. \
Reply with a JSON array only, no prose and no code fences. Each element must be an object \
with the keys \"title\" (string), \"category\" (string), \"price\" (number, greater than zero), \
\"description\" (string) and \"tags\" (array of short strings). \
Return at most {{ max_records }} products and skip anything without a price.";

const EXTRACT_USER: &str = "Catalog text:\n{{ text }}";

const ASK_SYSTEM: &str = "You are a helpful AI assistant specialized in e-commerce product \
recommendations.
Your task is to help explain why certain products are being recommended based on the provided \
product catalog and user behavior data.
Guidelines for responses:
1. Use only the provided product catalog and the user's behavior to justify recommendations.
2. Provide concise, factual explanations for \"Why this product?\" focusing on matching \
attributes, past user actions, and inferred preferences.
3. If the catalog lacks information needed to justify a recommendation, state what data is missing.
4. Keep explanations user-friendly and actionable (e.g., mention features the user cares about).";

const ASK_USER: &str = "Please analyze the following product catalog context and user question. \
Use only the catalog and user behavior to answer. If the catalog does not contain necessary \
details to justify a recommendation, explicitly state what's missing.

Catalog / Context:
{{ context }}

Question: {{ query }}

Provide a concise answer and, if appropriate, suggest minimum 2 recommended products with short \
justifications.";

const EXPLAIN_SYSTEM: &str = "You produce brief explainability statements.";

const EXPLAIN_USER: &str = "You are an e-commerce recommendation explainability assistant. \
Given the catalog excerpt and user behavior, produce a short explanation for each recommended \
product explaining why it was recommended. Use only the information provided.

Catalog excerpt:
{% for product in catalog %}- {{ product.id }}: {{ product.title }} ({{ product.category }}) ${{ product.price }}
{% endfor %}
User behavior:
{{ behavior }}

Recommended products:
{% for product in recommended %}- {{ product.id }}: {{ product.title }} (score {{ product.score }})
{% endfor %}";

/// Catalog line as rendered into the explanation prompt.
#[derive(Clone, Debug, Serialize)]
pub struct PromptProduct {
    pub id: String,
    pub title: String,
    pub category: String,
    pub price: String,
    pub score: u32,
}

pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, LlmError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("extract_system.txt", EXTRACT_SYSTEM),
            ("extract_user.txt", EXTRACT_USER),
            ("ask_system.txt", ASK_SYSTEM),
            ("ask_user.txt", ASK_USER),
            ("explain_system.txt", EXPLAIN_SYSTEM),
            ("explain_user.txt", EXPLAIN_USER),
        ])
        .map_err(|error| LlmError::Prompt(error.to_string()))?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, LlmError> {
        self.tera.render(name, context).map_err(|error| LlmError::Prompt(format!("{name}: {error}")))
    }

    pub fn extraction(&self, text: &str, max_records: usize) -> Result<Vec<ChatMessage>, LlmError> {
        let mut context = Context::new();
        context.insert("text", text);
        context.insert("max_records", &max_records);

        Ok(vec![
            ChatMessage::system(self.render("extract_system.txt", &context)?),
            ChatMessage::user(self.render("extract_user.txt", &context)?),
        ])
    }

    pub fn question(&self, context_text: &str, query: &str) -> Result<Vec<ChatMessage>, LlmError> {
        let mut context = Context::new();
        context.insert("context", context_text);
        context.insert("query", query);

        Ok(vec![
            ChatMessage::system(self.render("ask_system.txt", &context)?),
            ChatMessage::user(self.render("ask_user.txt", &context)?),
        ])
    }

    pub fn explanation(
        &self,
        catalog: &[PromptProduct],
        behavior: &serde_json::Value,
        recommended: &[PromptProduct],
    ) -> Result<Vec<ChatMessage>, LlmError> {
        let mut context = Context::new();
        context.insert("catalog", catalog);
        context.insert("behavior", &behavior.to_string());
        context.insert("recommended", recommended);

        Ok(vec![
            ChatMessage::system(self.render("explain_system.txt", &context)?),
            ChatMessage::user(self.render("explain_user.txt", &context)?),
        ])
    }
}
