//! Extractors that report malformed input in the catalog's own error shapes.

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::domain::DomainError;

/// A path identifier. One that cannot be parsed names nothing, so it is a 404.
pub struct IdPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!("Unresolvable identifier in {}: {}", parts.uri.path(), rejection);
                Err(ApiError::Domain(DomainError::NotFound))
            }
        }
    }
}

/// A JSON body whose syntax or type errors come back as field-level validation errors.
pub struct JsonInput<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonInput(value)),
            Err(rejection) => Err(DomainError::field("__all__", rejection.body_text()).into()),
        }
    }
}
