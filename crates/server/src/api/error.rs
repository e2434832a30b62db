//! # API Errors
//!
//! Every failure leaves the server as `{ "error": "...", "kind": "..." }`
//! with a status code chosen by the error's origin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use voyager_core::chat::ChatError;
use voyager_core::memory::MemoryError;
use voyager_core::nlp::NlpError;
use voyager_core::session::SessionError;
use voyager_core::travel::{BudgetError, PlanError, TripRequestError};

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Machine-readable error kind
    pub kind: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, kind, message)
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.kind, status = %self.status, "{}", self.message);
        } else {
            tracing::debug!(kind = self.kind, status = %self.status, "{}", self.message);
        }

        let body = ErrorBody {
            error: self.message,
            kind: self.kind.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<NlpError> for ApiError {
    fn from(e: NlpError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.kind(), e.to_string())
    }
}

impl From<MemoryError> for ApiError {
    fn from(e: MemoryError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.kind(), e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.kind(), e.to_string()),
            SessionError::Expired(_) => Self::new(StatusCode::GONE, e.kind(), e.to_string()),
            SessionError::Memory(e) => e.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Nlp(e) => e.into(),
            ChatError::Completion(ref inner) => {
                Self::new(StatusCode::BAD_GATEWAY, inner.kind(), e.to_string())
            }
            ChatError::Memory(e) => e.into(),
        }
    }
}

impl From<TripRequestError> for ApiError {
    fn from(e: TripRequestError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_trip", e.to_string())
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "missing_trip_data", e.to_string())
    }
}

impl From<BudgetError> for ApiError {
    fn from(e: BudgetError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "budget_overflow", e.to_string())
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use voyager_core::llm::CompletionError;

    #[test]
    fn test_status_mapping() {
        let e: ApiError = NlpError::EmptyInput.into();
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(e.kind, "empty_input");

        let e: ApiError = SessionError::NotFound("abc".to_string()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = SessionError::Expired("abc".to_string()).into();
        assert_eq!(e.status, StatusCode::GONE);

        let e: ApiError = ChatError::Completion(CompletionError::EmptyResponse).into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        assert_eq!(e.kind, "empty_response");

        let e: ApiError = TripRequestError::NoInterests.into();
        assert_eq!(e.message, "Please select at least one interest.");
    }
}
