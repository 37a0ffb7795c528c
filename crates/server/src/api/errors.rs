use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use shared::error::{InventoryError, TicketError};

/// Structured API error with a consistent JSON envelope. Maps directly
/// onto §7's four error classes: validation (400), not-found (404),
/// state-conflict (409), operational (500).
#[derive(Debug)]
pub enum ApiError {
    /// 401 Unauthorized - missing or invalid bearer token.
    Unauthorized { message: String },

    /// 400 Bad Request - validation errors (bad status filter, empty
    /// upload, unsupported triple, unknown search field).
    BadRequest { message: String },

    /// 404 Not Found - unknown serial or unknown ticket id.
    NotFound { resource: String, message: String },

    /// 409 Conflict - state-conflict errors (releasing an unreachable
    /// device).
    Conflict { message: String },

    /// 500 Internal Server Error - operational errors (SSH failure,
    /// catalog reload failure).
    InternalError { message: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized { message: msg.into() }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest { message: msg.into() }
    }

    pub fn not_found(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into(), message: msg.into() }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError { message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                "Authentication required".to_string(),
                Some(message),
            ),
            ApiError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST".to_string(),
                "Invalid request".to_string(),
                Some(message),
            ),
            ApiError::NotFound { resource, message } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                format!("{resource} not found"),
                Some(message),
            ),
            ApiError::Conflict { message } => (
                StatusCode::CONFLICT,
                "CONFLICT".to_string(),
                "Request conflicts with current device state".to_string(),
                Some(message),
            ),
            ApiError::InternalError { message } => {
                tracing::error!("internal API error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR".to_string(),
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse { error: ErrorDetail { code, message, details } };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("converting anyhow error: {:?}", err);
        ApiError::internal(format!("{err:#}"))
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::UnknownStatus(status) => ApiError::bad_request(format!("unknown device status: {status}")),
            InventoryError::NoMatchingDevice { .. } => ApiError::not_found("Device", err.to_string()),
            InventoryError::ReloadFailed(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::EmptyPayload => ApiError::bad_request("No configuration payload was supplied"),
            TicketError::UnsupportedTriple { .. } => {
                ApiError::bad_request("The specified vendor/model/version is not supported")
            }
            TicketError::NotFound(id) => ApiError::not_found("Ticket", format!("no such ticket: {id}")),
            TicketError::UnknownSearchField(field) => ApiError::bad_request(format!("unknown search field: {field}")),
            TicketError::Storage(detail) => ApiError::internal(detail),
        }
    }
}
