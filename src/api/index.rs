use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::error::ApiError;
use crate::infrastructure::AppState;
use crate::infrastructure::session::{SESSION_COOKIE, cookie_value};
use crate::services;

/// Catalog home page figures, plus the visit counter when it is enabled.
#[utoipa::path(
    get,
    path = "/catalog/",
    responses(
        (status = 200, description = "Catalog counts")
    )
)]
pub async fn catalog_index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let counts = services::catalog_counts(&state).await?;
    let mut body = json!(counts);

    if !state.config.track_visits {
        return Ok(Json(body).into_response());
    }

    let session_id = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| cookie_value(cookies, SESSION_COOKIE));
    let (session_id, num_visits) = state.sessions.record_visit(session_id);
    body["num_visits"] = json!(num_visits);

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
