use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for linking a question to a spacing profile
#[derive(Debug, Deserialize)]
pub struct CreateReviewItemRequest {
    pub question_id: i32,
    pub spacing_profile_id: i32,
}

/// Request payload for a completed review
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 0, max = 5, message = "Quality must be between 0 and 5"))]
    pub quality: i32,
    #[validate(range(min = 0.0, message = "Elapsed time must not be negative"))]
    pub elapsed_time: f64,
}

/// Standard error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}
