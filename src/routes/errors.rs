use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use std::fmt;

use crate::core::{FieldError, ServiceError};
use crate::models::ErrorResponse;
use crate::services::AuthError;

fn error_body(
    status: StatusCode,
    error: &str,
    message: impl Into<String>,
    fields: Option<Vec<FieldError>>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
        fields,
    })
}

fn internal_error(detail: &dyn fmt::Display) -> HttpResponse {
    tracing::error!("Request failed: {}", detail);
    error_body(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
        None,
    )
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            ServiceError::Validation(fields) => {
                tracing::info!("Validation failed: {:?}", fields);
                error_body(status, "validation_failed", self.to_string(), Some(fields.clone()))
            }
            ServiceError::NotFound(_) => error_body(status, "not_found", self.to_string(), None),
            ServiceError::Conflict(_) => error_body(status, "conflict", self.to_string(), None),
            ServiceError::Store(_) => internal_error(self),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) | AuthError::ProfileIncomplete => StatusCode::FORBIDDEN,
            AuthError::Signing(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Service(inner) => inner.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AuthError::InvalidCredentials => {
                error_body(status, "unauthorized", "Invalid email or password", None)
            }
            AuthError::MissingToken => error_body(status, "unauthorized", self.to_string(), None),
            AuthError::InvalidToken(reason) => {
                tracing::info!("Rejected session token: {}", reason);
                error_body(status, "unauthorized", "Invalid or expired session token", None)
            }
            AuthError::Forbidden(_) => error_body(status, "forbidden", self.to_string(), None),
            AuthError::ProfileIncomplete => {
                error_body(status, "profile_incomplete", self.to_string(), None)
            }
            AuthError::Signing(_) | AuthError::Store(_) => internal_error(self),
            AuthError::Service(inner) => inner.error_response(),
        }
    }
}

/// Malformed request bodies and query strings
#[derive(Debug, serde::Serialize)]
pub struct RequestError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for RequestError {}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), &self.error, self.message.clone(), None)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    RequestError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    RequestError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}
