use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionId(pub String);

impl InteractionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Query,
    View,
    Click,
    Search,
    RecommendationShown,
    RecommendationClicked,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::View => "view",
            Self::Click => "click",
            Self::Search => "search",
            Self::RecommendationShown => "recommendation_shown",
            Self::RecommendationClicked => "recommendation_clicked",
        }
    }
}

impl std::str::FromStr for InteractionType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "view" => Ok(Self::View),
            "click" => Ok(Self::Click),
            "search" => Ok(Self::Search),
            "recommendation_shown" => Ok(Self::RecommendationShown),
            "recommendation_clicked" => Ok(Self::RecommendationClicked),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown interaction type `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionProduct {
    pub product_id: ProductId,
    pub product_title: String,
    pub relevance_score: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInteraction {
    pub id: InteractionId,
    pub session_id: String,
    pub user_id: String,
    pub interaction_type: InteractionType,
    pub query: Option<String>,
    pub products: Vec<InteractionProduct>,
    pub ai_response: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
