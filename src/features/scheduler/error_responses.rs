use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::data::models::{ApiError, ErrorBody, ReviewError};

impl ReviewError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::InvalidQuality(_) | ReviewError::InvalidElapsedTime(_) => {
                StatusCode::BAD_REQUEST
            }
            ReviewError::ReviewItemNotFound(_)
            | ReviewError::SpacingProfileNotFound(_)
            | ReviewError::QuestionNotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::AlreadyScheduled { .. } | ReviewError::ConcurrentModification { .. } => {
                StatusCode::CONFLICT
            }
            ReviewError::ScheduleOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewError::Config(_) | ReviewError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Storage details stay in the log
            ReviewError::Storage(e) => {
                log::error!("Storage failure: {}", e);
                "Storage error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Review(e) => return e.into_response(),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::InvalidRequest(e) => (StatusCode::BAD_REQUEST, e),
            ApiError::Internal(e) => {
                log::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}
