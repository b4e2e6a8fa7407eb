use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::PageQuery;
use crate::api::error::ApiError;
use crate::api::extract::IdPath;
use crate::domain::{BookDetail, BookSummary, DomainError, Page};
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/catalog/books/",
    params(("page" = Option<u64>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of books, ten per page"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookSummary>>, ApiError> {
    Ok(Json(state.book_repo.find_page(query.number()?).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book with author, language, genres and copies"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    IdPath(id): IdPath<i32>,
) -> Result<Json<BookDetail>, ApiError> {
    state
        .book_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::Domain(DomainError::NotFound))
}
