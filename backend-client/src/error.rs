use thiserror::Error;

/// Errors produced while talking to the generation service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service answered with a non-success status. The response body is
    /// kept verbatim when it parses as JSON so callers can surface the
    /// service's `detail` message.
    #[error("generation service returned status {status}")]
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },

    /// The request never produced an HTTP response, or the success body
    /// failed to decode.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured base URL is not a valid URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl BackendError {
    /// Returns the `detail` string from a structured error body, if the
    /// service provided one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Status {
                body: Some(body), ..
            } => body.get("detail").and_then(serde_json::Value::as_str),
            _ => None,
        }
    }

    /// Returns the HTTP status for service-level failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::BackendError;

    #[test]
    fn detail_reads_string_field_from_body() {
        let err = BackendError::Status {
            status: 500,
            body: Some(json!({ "detail": "boom" })),
        };
        assert_eq!(err.detail(), Some("boom"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn detail_is_none_for_missing_or_non_string_fields() {
        let unstructured = BackendError::Status {
            status: 404,
            body: None,
        };
        assert_eq!(unstructured.detail(), None);

        let wrong_type = BackendError::Status {
            status: 422,
            body: Some(json!({ "detail": { "nested": true } })),
        };
        assert_eq!(wrong_type.detail(), None);
    }
}
