//! The single error shape every API call fails with.

use http::StatusCode;

/// A failed call to the remote API.
///
/// Every failure is reduced to an optional HTTP status and a human-readable message, which is
/// what pages display. There is no retry information because nothing is ever retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// The HTTP status of the response, or `None` if no response was received.
    pub status: Option<u16>,
    /// The server's `message` field, the raw response text, or the transport error.
    pub message: String,
}

impl ApiError {
    /// Builds an error for a non-success response.
    ///
    /// The server wraps failures as `{ "message": ... }`; when that is absent we fall back
    /// to the body text and finally to the canonical reason phrase of the status.
    pub(crate) fn from_response_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Self {
            status: Some(status.as_u16()),
            message,
        }
    }

    /// Builds an error for a request that never produced a response.
    pub(crate) fn transport(error: &reqwest::Error) -> Self {
        Self {
            status: error.status().map(|s| s.as_u16()),
            message: format!("network error: {error}"),
        }
    }

    /// Builds an error for a request that could not even be assembled locally.
    pub(crate) fn local(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Builds an error for a successful response whose body did not decode.
    pub(crate) fn decode(status: StatusCode, error: impl std::fmt::Display) -> Self {
        Self {
            status: Some(status.as_u16()),
            message: format!("unexpected response from server: {error}"),
        }
    }

    /// Whether the server rejected the request for lack of a valid session.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Whether the failure happened before any response arrived.
    ///
    /// This covers connection failures as well as requests that could not be built.
    pub fn is_network(&self) -> bool {
        self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_server_message() {
        let err = ApiError::from_response_body(
            StatusCode::CONFLICT,
            r#"{"statusCode":409,"message":"User with email or username already exists","success":false}"#,
        );
        assert_eq!(err.status, Some(409));
        insta::assert_snapshot!(err, @"User with email or username already exists");
    }

    #[test]
    fn falls_back_to_body_text() {
        let err = ApiError::from_response_body(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(err.message, "upstream down");
    }

    #[test]
    fn falls_back_to_reason_phrase() {
        let err = ApiError::from_response_body(StatusCode::UNAUTHORIZED, "");
        assert!(err.is_unauthorized());
        assert!(!err.is_network());
        insta::assert_snapshot!(err, @"Unauthorized");
    }

    #[test]
    fn blank_message_field_is_ignored() {
        let err = ApiError::from_response_body(StatusCode::NOT_FOUND, r#"{"message":"  "}"#);
        assert_eq!(err.message, r#"{"message":"  "}"#);
    }
}
