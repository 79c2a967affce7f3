use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use tokio::task::JoinError;
use validator::ValidationErrors;

use crate::data::models::ApiError;

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", err))
    }
}

// Malformed bodies, paths and query strings get the same JSON error body as
// failed validation
impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::InvalidRequest(err.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::InvalidRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::InvalidRequest(err.body_text())
    }
}
