use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const SESSION_HEADER: &str = "x-session-id";
pub const USER_HEADER: &str = "x-user-id";
pub const CORRELATION_HEADER: &str = "x-correlation-id";
pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_USER_ID: &str = "anonymous";
const MAX_HEADER_CHARS: usize = 128;

/// Who is calling. Selects the session's last uploaded document and tags
/// every recorded interaction; never stored in process-wide state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: String,
    pub correlation_id: String,
}

impl SessionContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            session_id: header_value(headers, SESSION_HEADER)
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            user_id: header_value(headers, USER_HEADER)
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            correlation_id: header_value(headers, CORRELATION_HEADER)
                .unwrap_or_else(|| format!("req-{}", uuid::Uuid::new_v4().simple())),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.chars().take(MAX_HEADER_CHARS).collect())
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::{SessionContext, DEFAULT_SESSION_ID, DEFAULT_USER_ID};

    #[test]
    fn missing_headers_fall_back_to_defaults() {
        let session = SessionContext::from_headers(&HeaderMap::new());

        assert_eq!(session.session_id, DEFAULT_SESSION_ID);
        assert_eq!(session.user_id, DEFAULT_USER_ID);
        assert!(session.correlation_id.starts_with("req-"));
    }

    #[test]
    fn headers_are_trimmed_and_blank_values_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-session-id", HeaderValue::from_static("  s-42 "));
        headers.insert("x-user-id", HeaderValue::from_static("   "));
        headers.insert("x-correlation-id", HeaderValue::from_static("corr-1"));

        let session = SessionContext::from_headers(&headers);

        assert_eq!(session.session_id, "s-42");
        assert_eq!(session.user_id, DEFAULT_USER_ID);
        assert_eq!(session.correlation_id, "corr-1");
    }
}
