use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pickwise_agent::{AskError, LlmError};
use pickwise_core::document::DocumentError;
use pickwise_core::errors::{ApplicationError, InterfaceError, BILLING_REMEDIATION};
use pickwise_core::snippets::SnippetMatch;
use pickwise_db::repositories::RepositoryError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets: Option<SnippetMatch>,
    pub correlation_id: String,
}

/// Every handler failure, already carrying its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, correlation_id: &str) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                details: None,
                help: None,
                snippets: None,
                correlation_id: correlation_id.to_string(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, correlation_id)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.body.help = Some(help.into());
        self
    }

    pub fn from_interface(error: InterfaceError) -> Self {
        let (status, correlation_id) = match &error {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id)
            }
            InterfaceError::PaymentRequired { correlation_id, .. } => {
                (StatusCode::PAYMENT_REQUIRED, correlation_id)
            }
            InterfaceError::Conflict { correlation_id, .. } => (StatusCode::CONFLICT, correlation_id),
            InterfaceError::ServiceUnavailable { correlation_id, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, correlation_id)
            }
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id)
            }
        };

        let mut api = Self::new(status, error.user_message(), correlation_id)
            .with_details(error.message().to_string());
        api.body.help = error.remediation().map(str::to_string);
        api
    }

    pub fn application(error: ApplicationError, correlation_id: &str) -> Self {
        Self::from_interface(error.into_interface(correlation_id))
    }

    pub fn repository(error: RepositoryError, correlation_id: &str) -> Self {
        Self::application(persistence_error(error), correlation_id)
    }

    pub fn document(error: DocumentError, correlation_id: &str) -> Self {
        let status = if error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, error.to_string(), correlation_id)
    }

    pub fn ask(error: AskError, correlation_id: &str) -> Self {
        match error {
            AskError::EmptyQuery | AskError::NoDocument => {
                Self::bad_request(error.to_string(), correlation_id)
            }
            AskError::Billing { details, snippets } => {
                let mut api =
                    Self::new(StatusCode::PAYMENT_REQUIRED, "LLM service billing/credits error", correlation_id)
                        .with_details(details)
                        .with_help(BILLING_REMEDIATION);
                api.body.snippets = snippets;
                api
            }
            AskError::Service(llm) => {
                Self::new(llm_status(&llm), llm.user_message(), correlation_id)
            }
        }
    }
}

pub fn persistence_error(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::DuplicateSku(sku) => {
            ApplicationError::Conflict(format!("Product with SKU `{sku}` already exists"))
        }
        other => ApplicationError::Persistence(other.to_string()),
    }
}

fn llm_status(error: &LlmError) -> StatusCode {
    match error {
        LlmError::Disabled | LlmError::Timeout(_) | LlmError::Transport(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        LlmError::Status { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
        LlmError::Billing(_) => StatusCode::PAYMENT_REQUIRED,
        LlmError::Status { .. } | LlmError::EmptyResponse | LlmError::InvalidResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        LlmError::Prompt(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                event_name = "http.request.failed",
                correlation_id = %self.body.correlation_id,
                status = self.status.as_u16(),
                error = %self.body.error,
                details = self.body.details.as_deref().unwrap_or_default(),
                "request failed"
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pickwise_agent::{AskError, LlmError};
    use pickwise_core::document::DocumentError;
    use pickwise_core::errors::{ApplicationError, DomainError, ExternalServiceError};
    use pickwise_db::repositories::RepositoryError;

    use super::ApiError;

    #[test]
    fn application_errors_map_onto_status_codes() {
        let cases = [
            (ApplicationError::Domain(DomainError::InvalidProduct("x".into())), StatusCode::BAD_REQUEST),
            (
                ApplicationError::External(ExternalServiceError::BillingExhausted("402".into())),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (ApplicationError::Conflict("sku".into()), StatusCode::CONFLICT),
            (ApplicationError::Persistence("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApplicationError::Configuration("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::application(error, "req-1").status, expected);
        }
    }

    #[test]
    fn duplicate_sku_is_a_conflict() {
        let api = ApiError::repository(RepositoryError::DuplicateSku("FOO-1".into()), "req-2");

        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.body.details.is_some_and(|details| details.contains("FOO-1")));
    }

    #[test]
    fn document_rejections_are_client_errors_and_parse_failures_are_not() {
        assert_eq!(ApiError::document(DocumentError::NotPdf, "r").status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::document(DocumentError::Encrypted("locked".into()), "r").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ask_failures_keep_specific_messages() {
        let timeout = ApiError::ask(AskError::Service(LlmError::Timeout("30s".into())), "r");
        assert_eq!(timeout.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.body.error, "Request timed out. Please try again.");

        let auth = ApiError::ask(
            AskError::Service(LlmError::Status { status: 401, message: "bad key".into() }),
            "r",
        );
        assert_eq!(auth.status, StatusCode::BAD_GATEWAY);
        assert!(auth.body.error.contains("authentication failed"));

        let billing = ApiError::ask(
            AskError::Billing { details: "LLM unavailable (billing).".into(), snippets: None },
            "r",
        );
        assert_eq!(billing.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(billing.body.error, "LLM service billing/credits error");
        assert!(billing.body.help.is_some());
    }
}
