use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::index::catalog_index,
        api::books::list_books,
        api::books::get_book,
        api::author::list_authors,
        api::author::get_author,
    ),
    tags(
        (name = "locallibrary", description = "LocalLibrary catalog API")
    )
)]
pub struct ApiDoc;
