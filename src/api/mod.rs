pub mod admin;
pub mod auth;
pub mod author;
pub mod book_instance;
pub mod books;
pub mod error;
pub mod extract;
pub mod genre;
pub mod health;
pub mod index;
pub mod language;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// `?page=N`, 1-based; absent means the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// A page that is not a number cannot exist, so it is a 404 like any out-of-range page.
    pub fn number(&self) -> Result<u64, ApiError> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::Domain(DomainError::NotFound)),
        }
    }
}

/// Public catalog pages and the staff workflows built on them.
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/catalog/", get(index::catalog_index))
        // Books
        .route("/catalog/books/", get(books::list_books))
        .route("/catalog/book/:id", get(books::get_book))
        // Authors
        .route("/catalog/authors/", get(author::list_authors))
        .route(
            "/catalog/author/create/",
            get(author::author_create_form).post(author::author_create),
        )
        .route("/catalog/author/:id", get(author::get_author))
        .route(
            "/catalog/author/:id/update/",
            get(author::author_update_form).post(author::author_update),
        )
        .route("/catalog/author/:id/delete/", post(author::author_delete))
        // Genres & languages
        .route("/catalog/genres/", get(genre::list_genres))
        .route("/catalog/genre/:id", get(genre::get_genre))
        .route("/catalog/languages/", get(language::list_languages))
        .route("/catalog/language/:id", get(language::get_language))
        // Copies & loans
        .route("/catalog/bookinstance/:id", get(book_instance::get_book_instance))
        .route("/catalog/mybooks/", get(book_instance::loaned_books_by_user))
        .route("/catalog/borrowed/", get(book_instance::all_borrowed))
        .route(
            "/catalog/book/:id/renew/",
            get(book_instance::renew_book_form).post(book_instance::renew_book),
        )
}

/// Capability-gated data management.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/genre", post(admin::create_genre))
        .route(
            "/genre/:id",
            put(admin::update_genre).delete(admin::delete_genre),
        )
        .route("/language", post(admin::create_language))
        .route(
            "/language/:id",
            put(admin::update_language).delete(admin::delete_language),
        )
        .route("/author", post(admin::create_author))
        .route(
            "/author/:id",
            put(admin::update_author).delete(admin::delete_author),
        )
        .route("/book", post(admin::create_book))
        .route(
            "/book/:id",
            put(admin::update_book).delete(admin::delete_book),
        )
        .route("/bookinstance", post(admin::create_book_instance))
        .route(
            "/bookinstance/:id",
            put(admin::update_book_instance).delete(admin::delete_book_instance),
        )
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(catalog_router())
        .nest("/admin/catalog", admin_router())
        .route(
            "/accounts/login/",
            get(auth::login_form).post(auth::login),
        )
        .route("/api/health", get(health::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(raw: Option<&str>) -> PageQuery {
        PageQuery {
            page: raw.map(str::to_string),
        }
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page(None).number().unwrap(), 1);
        assert_eq!(page(Some("")).number().unwrap(), 1);
        assert_eq!(page(Some("3")).number().unwrap(), 3);
    }

    #[test]
    fn non_numeric_page_is_not_found() {
        for raw in ["abc", "-1", "2.5"] {
            assert!(matches!(
                page(Some(raw)).number(),
                Err(ApiError::Domain(DomainError::NotFound))
            ));
        }
    }
}
