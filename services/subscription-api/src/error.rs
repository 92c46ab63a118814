//! Error types for the Subscription API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use spotter_core::SubscriptionError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Subscription(e) => match e {
                e if e.is_not_found() => StatusCode::NOT_FOUND,
                SubscriptionError::AlreadyPending { .. }
                | SubscriptionError::StateConflict { .. } => StatusCode::CONFLICT,
                SubscriptionError::PlanIncompatible { .. }
                | SubscriptionError::PrerequisiteMissing(_)
                | SubscriptionError::UserInactive { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SubscriptionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Subscription(e) => e.reason_code(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Subscription(SubscriptionError::PlanIncompatible { reason, .. }) => {
                Some(json!({ "reason": reason }))
            }
            Self::Subscription(SubscriptionError::StateConflict { current, expected }) => Some(
                json!({ "current_status": current.as_str(), "expected_status": expected.as_str() }),
            ),
            Self::Subscription(SubscriptionError::AlreadyPending { plan_name }) => {
                Some(json!({ "plan_name": plan_name }))
            }
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Subscription(e) if !e.is_validation())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors, never leak their text
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
