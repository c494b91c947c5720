use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl UploadId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Uploaded,
    Processed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "uploaded" => Ok(Self::Uploaded),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => {
                Err(DomainError::InvariantViolation(format!("unknown upload status `{other}`")))
            }
        }
    }
}

/// The persisted record of one uploaded catalog document. The most recent
/// upload of a session is the document questions are answered against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogUpload {
    pub id: UploadId,
    pub session_id: String,
    pub user_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub extracted_text: String,
    pub text_length: u64,
    pub products_extracted: u32,
    pub status: UploadStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl CatalogUpload {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        file_name: impl Into<String>,
        file_size: u64,
        extracted_text: String,
    ) -> Self {
        let text_length = extracted_text.chars().count() as u64;
        Self {
            id: UploadId::generate(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            file_name: file_name.into(),
            file_size,
            extracted_text,
            text_length,
            products_extracted: 0,
            status: UploadStatus::Uploaded,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }
}
