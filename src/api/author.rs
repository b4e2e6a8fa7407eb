use axum::{
    Form, Json,
    extract::{Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::PageQuery;
use crate::api::error::{ApiError, found};
use crate::api::extract::IdPath;
use crate::domain::validation::{format_form_date, parse_form_date};
use crate::domain::{
    AuthorDetail, AuthorInput, AuthorSummary, DomainError, Page, ValidationErrors,
};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::LoginRequired;

const AUTHOR_FIELDS: [&str; 4] = ["first_name", "last_name", "date_of_birth", "date_of_death"];

/// Author form as posted by the browser; dates arrive as text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthorForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl AuthorForm {
    fn into_input(self) -> Result<AuthorInput, DomainError> {
        let mut errors = ValidationErrors::new();
        let mut date = |field: &str, raw: &str| -> Option<NaiveDate> {
            parse_form_date(raw).unwrap_or_else(|msg| {
                errors.add(field, msg);
                None
            })
        };
        let date_of_birth = date("date_of_birth", &self.date_of_birth);
        let date_of_death = date("date_of_death", &self.date_of_death);
        errors.into_result()?;

        Ok(AuthorInput {
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth,
            date_of_death,
        })
    }
}

fn form_description(action: &str, initial: Value) -> Json<Value> {
    Json(json!({
        "form": {
            "action": action,
            "method": "post",
            "fields": AUTHOR_FIELDS,
            "initial": initial,
        }
    }))
}

fn date_or_null(date: Option<NaiveDate>) -> Value {
    date.map(|d| json!(format_form_date(d))).unwrap_or(Value::Null)
}

#[utoipa::path(
    get,
    path = "/catalog/authors/",
    params(("page" = Option<u64>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of authors ordered by last then first name"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<AuthorSummary>>, ApiError> {
    Ok(Json(state.author_repo.find_page(query.number()?).await?))
}

#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    params(("id" = i32, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author with their books"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    IdPath(id): IdPath<i32>,
) -> Result<Json<AuthorDetail>, ApiError> {
    state
        .author_repo
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::Domain(DomainError::NotFound))
}

/// Empty creation form with the configured initial date of death.
pub async fn author_create_form(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
) -> Result<Json<Value>, ApiError> {
    user.require_perm("add_author")?;

    Ok(form_description(
        "/catalog/author/create/",
        json!({ "date_of_death": date_or_null(state.config.author_form_date_of_death) }),
    ))
}

pub async fn author_create(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    Form(form): Form<AuthorForm>,
) -> Result<Response, ApiError> {
    user.require_perm("add_author")?;

    let author = state.author_repo.create(form.into_input()?).await?;
    tracing::info!("{} created author {}", user.username, author.id);

    Ok(found(&author.absolute_url()))
}

pub async fn author_update_form(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<Json<Value>, ApiError> {
    user.require_perm("change_author")?;

    let detail = state
        .author_repo
        .find_by_id(id)
        .await?
        .ok_or(ApiError::Domain(DomainError::NotFound))?;
    let author = detail.author;

    Ok(form_description(
        &format!("/catalog/author/{}/update/", id),
        json!({
            "first_name": author.first_name,
            "last_name": author.last_name,
            "date_of_birth": date_or_null(author.date_of_birth),
            "date_of_death": date_or_null(author.date_of_death),
        }),
    ))
}

pub async fn author_update(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
    Form(form): Form<AuthorForm>,
) -> Result<Response, ApiError> {
    user.require_perm("change_author")?;

    let author = state.author_repo.update(id, form.into_input()?).await?;
    Ok(found(&author.absolute_url()))
}

pub async fn author_delete(
    State(state): State<AppState>,
    LoginRequired(user): LoginRequired,
    IdPath(id): IdPath<i32>,
) -> Result<Response, ApiError> {
    user.require_perm("delete_author")?;

    state.author_repo.delete(id).await?;
    tracing::info!("{} deleted author {}", user.username, id);

    Ok(found("/catalog/authors/"))
}
