//! Administrative JSON API: capability-gated writes for every catalog entity.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::extract::{IdPath, JsonInput};
use crate::domain::{AuthorInput, BookInput, BookInstanceInput, NamedInput};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::LoginRequired;

fn deleted(kind: &str) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": format!("{} deleted", kind) })),
    )
}

// Genres

pub async fn create_genre(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    JsonInput(payload): JsonInput<NamedInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("add_genre")?;
    let genre = state.genre_repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn update_genre(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
    JsonInput(payload): JsonInput<NamedInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("change_genre")?;
    Ok(Json(state.genre_repo.update(id, payload).await?))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("delete_genre")?;
    state.genre_repo.delete(id).await?;
    Ok(deleted("Genre"))
}

// Languages

pub async fn create_language(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    JsonInput(payload): JsonInput<NamedInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("add_language")?;
    let language = state.language_repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

pub async fn update_language(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
    JsonInput(payload): JsonInput<NamedInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("change_language")?;
    Ok(Json(state.language_repo.update(id, payload).await?))
}

pub async fn delete_language(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("delete_language")?;
    state.language_repo.delete(id).await?;
    Ok(deleted("Language"))
}

// Authors

pub async fn create_author(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    JsonInput(payload): JsonInput<AuthorInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("add_author")?;
    let author = state.author_repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
    JsonInput(payload): JsonInput<AuthorInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("change_author")?;
    Ok(Json(state.author_repo.update(id, payload).await?))
}

pub async fn delete_author(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("delete_author")?;
    state.author_repo.delete(id).await?;
    Ok(deleted("Author"))
}

// Books

pub async fn create_book(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    JsonInput(payload): JsonInput<BookInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("add_book")?;
    let book = state.book_repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
    JsonInput(payload): JsonInput<BookInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("change_book")?;
    Ok(Json(state.book_repo.update(id, payload).await?))
}

pub async fn delete_book(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("delete_book")?;
    state.book_repo.delete(id).await?;
    Ok(deleted("Book"))
}

// Book instances

pub async fn create_book_instance(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    JsonInput(payload): JsonInput<BookInstanceInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("add_bookinstance")?;
    let instance = state.instance_repo.create(payload).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

pub async fn update_book_instance(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<String>,
    JsonInput(payload): JsonInput<BookInstanceInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("change_bookinstance")?;
    Ok(Json(state.instance_repo.update(&id, payload).await?))
}

pub async fn delete_book_instance(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_perm("delete_bookinstance")?;
    state.instance_repo.delete(&id).await?;
    Ok(deleted("Book instance"))
}
