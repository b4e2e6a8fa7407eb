use axum::{Json, extract::State};

use crate::api::error::ApiError;
use crate::api::extract::IdPath;
use crate::domain::{DomainError, NamedDetail};
use crate::infrastructure::AppState;
use crate::models::language;

pub async fn list_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<language::Model>>, ApiError> {
    Ok(Json(state.language_repo.find_all().await?))
}

pub async fn get_language(
    State(state): State<AppState>,
    IdPath(id): IdPath<i32>,
) -> Result<Json<NamedDetail>, ApiError> {
    state
        .language_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::Domain(DomainError::NotFound))
}
