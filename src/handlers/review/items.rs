use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
};
use chrono::Utc;
use tower_sessions::Session;
use validator::Validate;

use crate::{
    data::models::{
        ApiError, CreateReviewItemRequest, ListOptions, ReviewError, ReviewItem,
        ReviewItemWithQuestion, ReviewSchedule, SubmitReviewRequest,
    },
    features::scheduler::ReviewScheduler,
    handlers::{run_blocking, AppState},
    utils::require_user,
};

// Items belonging to someone else are reported as missing
fn owned_item(
    scheduler: &ReviewScheduler,
    id: i32,
    user_id: i32,
) -> Result<ReviewItem, ReviewError> {
    let item = scheduler.get_review_item(id)?;
    if item.user_id != user_id {
        log::warn!("User {} requested review item {} owned by another user", user_id, id);
        return Err(ReviewError::ReviewItemNotFound(id));
    }
    Ok(item)
}

pub async fn create_review_item(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<CreateReviewItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewItem>), ApiError> {
    let user_id = require_user(&session).await?;
    let Json(payload) = payload?;
    let scheduler = state.scheduler.clone();

    let item = run_blocking(move || {
        scheduler.create_review_item(payload.question_id, payload.spacing_profile_id, user_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_review_item(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ReviewItem>, ApiError> {
    let user_id = require_user(&session).await?;
    let Path(id) = id?;
    let scheduler = state.scheduler.clone();

    let item = run_blocking(move || owned_item(&scheduler, id, user_id)).await?;
    Ok(Json(item))
}

pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewItem>, ApiError> {
    let user_id = require_user(&session).await?;
    let Path(id) = id?;
    let Json(payload) = payload?;
    payload.validate()?;
    let scheduler = state.scheduler.clone();

    let item = run_blocking(move || {
        owned_item(&scheduler, id, user_id)?;
        scheduler.submit_review(id, payload.quality, payload.elapsed_time)
    })
    .await?;

    Ok(Json(item))
}

pub async fn list_review_items(
    State(state): State<AppState>,
    session: Session,
    options: Result<Query<ListOptions>, QueryRejection>,
) -> Result<Json<Vec<ReviewItemWithQuestion>>, ApiError> {
    let user_id = require_user(&session).await?;
    let Query(mut options) = options?;
    options.user_id = Some(user_id);
    let scheduler = state.scheduler.clone();

    let items = run_blocking(move || scheduler.list_review_items(&options, Utc::now())).await?;
    Ok(Json(items))
}

pub async fn review_schedule(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ReviewSchedule>, ApiError> {
    let user_id = require_user(&session).await?;
    let scheduler = state.scheduler.clone();

    let schedule =
        run_blocking(move || scheduler.review_schedule(Some(user_id), Utc::now())).await?;
    Ok(Json(schedule))
}
