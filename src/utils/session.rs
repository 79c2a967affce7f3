use tower_sessions::Session;

use crate::data::models::ApiError;

/// Session key written by the authentication service
pub const USER_ID_KEY: &str = "user_id";

pub async fn current_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(USER_ID_KEY).await {
        Ok(Some(user_id)) => Some(user_id),
        Ok(None) => None,
        Err(e) => {
            log::error!("Failed to get user_id from session: {}", e);
            None
        }
    }
}

pub async fn require_user(session: &Session) -> Result<i32, ApiError> {
    current_user_id(session).await.ok_or(ApiError::Unauthorized)
}
