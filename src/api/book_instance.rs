use axum::{
    Form, Json,
    extract::{Query, State},
    response::Response,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::PageQuery;
use crate::api::error::{ApiError, found};
use crate::api::extract::IdPath;
use crate::domain::validation::{format_form_date, parse_form_date};
use crate::domain::{BookInstanceView, DomainError, Page};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::LoginRequired;
use crate::services;

pub async fn get_book_instance(
    State(state): State<AppState>,
    IdPath(id): IdPath<String>,
) -> Result<Json<BookInstanceView>, ApiError> {
    state
        .instance_repo
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::Domain(DomainError::NotFound))
}

/// Copies on loan to the caller, soonest due first.
pub async fn loaned_books_by_user(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookInstanceView>>, ApiError> {
    let page = state
        .instance_repo
        .find_on_loan(Some(user.id), query.number()?)
        .await?;
    Ok(Json(page))
}

/// Every copy on loan, for librarians.
pub async fn all_borrowed(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookInstanceView>>, ApiError> {
    user.require_perm("can_mark_returned")?;

    let page = state
        .instance_repo
        .find_on_loan(None, query.number()?)
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenewForm {
    pub renewal_date: String,
}

pub async fn renew_book_form(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_perm("can_mark_returned")?;

    let instance = state
        .instance_repo
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::Domain(DomainError::NotFound))?;
    let proposed = services::proposed_renewal_date(Local::now().date_naive());

    Ok(Json(json!({
        "book_instance": instance,
        "form": {
            "action": format!("/catalog/book/{}/renew/", id),
            "method": "post",
            "fields": ["renewal_date"],
            "initial": { "renewal_date": format_form_date(proposed) },
            "help_text": "Enter a date between now and 4 weeks (default 3).",
        }
    })))
}

pub async fn renew_book(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<String>,
    Form(form): Form<RenewForm>,
) -> Result<Response, ApiError> {
    user.require_perm("can_mark_returned")?;

    let renewal_date = parse_form_date(&form.renewal_date)
        .map_err(|msg| DomainError::field("renewal_date", msg))?
        .ok_or_else(|| DomainError::field("renewal_date", "This field is required."))?;

    services::renew_loan(&state, &id, renewal_date, Local::now().date_naive()).await?;
    tracing::info!("{} renewed book instance {} until {}", user.username, id, renewal_date);

    Ok(found("/catalog/borrowed/"))
}
