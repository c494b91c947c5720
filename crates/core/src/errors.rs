use thiserror::Error;

pub const BILLING_REMEDIATION: &str =
    "Purchase credits at https://openrouter.ai/settings/credits or use an API key on a funded account.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid behavior profile: {0}")]
    InvalidBehaviorProfile(String),
    #[error("invalid product: {0}")]
    InvalidProduct(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures of the generative-text collaborator, as seen by the core.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExternalServiceError {
    #[error("external service unavailable: {0}")]
    Unavailable(String),
    #[error("external service billing exhausted: {0}")]
    BillingExhausted(String),
    #[error("malformed external response: {0}")]
    MalformedResponse(String),
}

impl ExternalServiceError {
    pub fn is_billing(&self) -> bool {
        matches!(self, Self::BillingExhausted(_))
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::BillingExhausted(_) => Some(BILLING_REMEDIATION),
            Self::Unavailable(_) | Self::MalformedResponse(_) => None,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    External(#[from] ExternalServiceError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("payment required: {message}")]
    PaymentRequired { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::PaymentRequired { .. } => {
                "The language model service rejected the request for billing reasons."
            }
            Self::Conflict { .. } => "The request conflicts with an existing record.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::PaymentRequired { .. } => Some(BILLING_REMEDIATION),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::PaymentRequired { message, .. }
            | Self::Conflict { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::PaymentRequired { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::External(ExternalServiceError::BillingExhausted(message)) => {
                Self::PaymentRequired { message, correlation_id }
            }
            ApplicationError::External(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Conflict(message) => Self::Conflict { message, correlation_id },
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, ExternalServiceError, InterfaceError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::InvalidBehaviorProfile(
            "behavior must be a JSON object".to_owned(),
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("JSON object")
        ));
    }

    #[test]
    fn billing_failure_maps_to_payment_required_with_remediation() {
        let interface = ApplicationError::from(ExternalServiceError::BillingExhausted(
            "insufficient credits".to_owned(),
        ))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::PaymentRequired { .. }));
        assert!(interface.remediation().is_some_and(|hint| hint.contains("credits")));
    }

    #[test]
    fn unavailable_service_maps_to_service_unavailable() {
        let interface =
            ApplicationError::from(ExternalServiceError::Unavailable("timed out".to_owned()))
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
        assert_eq!(interface.remediation(), None);
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing key".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn only_billing_errors_carry_remediation() {
        assert!(ExternalServiceError::BillingExhausted("402".to_owned()).is_billing());
        assert!(ExternalServiceError::MalformedResponse("not json".to_owned())
            .remediation()
            .is_none());
    }
}
