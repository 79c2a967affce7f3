use axum::extract::{rejection::PathRejection, Json, Path, State};

use crate::{
    data::models::{ApiError, SpacingProfile},
    handlers::{run_blocking, AppState},
};

pub async fn list_spacing_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpacingProfile>>, ApiError> {
    let scheduler = state.scheduler.clone();
    let profiles = run_blocking(move || scheduler.list_spacing_profiles()).await?;
    Ok(Json(profiles))
}

pub async fn get_spacing_profile(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<SpacingProfile>, ApiError> {
    let Path(id) = id?;
    let scheduler = state.scheduler.clone();
    let profile = run_blocking(move || scheduler.get_spacing_profile(id)).await?;
    Ok(Json(profile))
}
