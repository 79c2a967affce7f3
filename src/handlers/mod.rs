pub mod review;

use axum::{
    routing::{get, post},
    Router,
};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::data::models::{ApiError, ReviewError};
use crate::features::scheduler::ReviewScheduler;
use review::{items, profiles};

/// Shared state for the API routers
#[derive(Clone)]
pub struct AppState {
    pub scheduler: ReviewScheduler,
}

/// Runs a repository-bound call on the blocking pool
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ReviewError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

pub fn api_router(state: AppState) -> Router {
    let profile_router = Router::new()
        .route("/", get(profiles::list_spacing_profiles))
        .route("/{id}", get(profiles::get_spacing_profile));

    let item_router = Router::new()
        .route("/", get(items::list_review_items).post(items::create_review_item))
        .route("/schedule", get(items::review_schedule))
        .route("/{id}", get(items::get_review_item))
        .route("/{id}/reviews", post(items::submit_review));

    Router::new()
        .nest("/spacing-profiles", profile_router)
        .nest("/review-items", item_router)
        .with_state(state)
}

pub fn app_router(state: AppState, session_expiry: time::Duration) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_expiry(Expiry::OnInactivity(session_expiry))
        .with_secure(false);

    Router::new()
        .nest("/api", api_router(state))
        .layer(session_layer)
}
