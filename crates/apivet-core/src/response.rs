//! Wire shape returned by `POST /validate`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::openapi::ApiSummary;
use crate::validate::ValidationOutcome;

pub const VALID_MESSAGE: &str = "API is valid";
pub const INVALID_MESSAGE: &str = "API validation failed";

/// `{message, api?, error?}`.
///
/// Responses built by this crate carry exactly one of `api` or `error`.
/// Responses deserialized from elsewhere are not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api: Option<ApiSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StructuredResponse {
    pub fn valid(api: ApiSummary) -> Self {
        Self {
            message: VALID_MESSAGE.to_string(),
            api: Some(api),
            error: None,
        }
    }

    pub fn invalid<S: Into<String>>(error: S) -> Self {
        Self {
            message: INVALID_MESSAGE.to_string(),
            api: None,
            error: Some(error.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn api(&self) -> Option<&ApiSummary> {
        self.api.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 200 for a valid document, 400 otherwise
    pub fn status(&self) -> StatusCode {
        if self.error.is_none() && self.api.is_some() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl From<ValidationOutcome> for StructuredResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        match outcome {
            ValidationOutcome::Valid(summary) => Self::valid(summary),
            ValidationOutcome::Invalid(error) => Self::invalid(error.to_string()),
        }
    }
}

impl IntoResponse for StructuredResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::ApiInfo;
    use crate::Error;
    use serde_json::json;

    fn summary() -> ApiSummary {
        ApiSummary {
            openapi: Some("3.0.0".to_string()),
            swagger: None,
            info: ApiInfo {
                title: "Test".to_string(),
                version: "1.0.0".to_string(),
            },
            paths: Default::default(),
        }
    }

    #[test]
    fn test_valid_shape() {
        let response = StructuredResponse::from(ValidationOutcome::Valid(summary()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "API is valid",
                "api": {
                    "openapi": "3.0.0",
                    "info": {"title": "Test", "version": "1.0.0"},
                    "paths": {}
                }
            })
        );
    }

    #[test]
    fn test_invalid_shape() {
        let outcome = ValidationOutcome::Invalid(Error::syntax_at(1, 10, "bad"));
        let response = StructuredResponse::from(outcome);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "message": "API validation failed",
                "error": "line 1, column 10: bad"
            })
        );
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let response: StructuredResponse =
            serde_json::from_str(r#"{"message": "API validation failed", "error": "boom"}"#)
                .unwrap();
        assert_eq!(response.error(), Some("boom"));
        assert!(response.api().is_none());
    }
}
