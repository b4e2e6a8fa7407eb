use axum::{Json, extract::State};

use crate::api::error::ApiError;
use crate::api::extract::IdPath;
use crate::domain::{DomainError, NamedDetail};
use crate::infrastructure::AppState;
use crate::models::genre;

pub async fn list_genres(
    State(state): State<AppState>,
) -> Result<Json<Vec<genre::Model>>, ApiError> {
    Ok(Json(state.genre_repo.find_all().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    IdPath(id): IdPath<i32>,
) -> Result<Json<NamedDetail>, ApiError> {
    state
        .genre_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::Domain(DomainError::NotFound))
}
