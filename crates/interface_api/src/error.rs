//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_kernel::PortError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Validation error: {0}")]
    Validation(String, Option<Vec<String>>),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg, None),
            ApiError::Validation(msg, details) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg, details)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{} {} not found", entity_type, id))
            }
            PortError::Validation { message, field } => ApiError::Validation(message, field.map(|f| vec![f])),
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Connection { message, .. } => {
                error!(%message, "Store unreachable");
                ApiError::Unavailable("invoice store unavailable".to_string())
            }
            other => {
                error!(error = %other, "Invoice operation failed");
                ApiError::Internal("invoice operation failed".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        ApiError::Validation("request validation failed".to_string(), Some(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::from(PortError::not_found("Invoice", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_422() {
        let response = ApiError::from(PortError::validation_field("bad key", "invoice_id")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_publish_failure_maps_to_500() {
        let response = ApiError::from(PortError::publish("bus down")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_connection_failure_maps_to_503() {
        let response = ApiError::from(PortError::connection("pool timed out")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
