use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{create_jwt, verify_password};

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

/// Describes the login form and echoes where to go afterwards.
pub async fn login_form(Query(query): Query<LoginQuery>) -> Json<Value> {
    Json(json!({
        "form": {
            "action": "/accounts/login/",
            "method": "post",
            "fields": ["username", "password"],
        },
        "next": query.next,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    tracing::info!("Login attempt for user: {}", payload.username);

    let Some(user) = state.user_repo.find_by_username(&payload.username).await? else {
        tracing::warn!("User not found: {}", payload.username);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            tracing::info!("Password verified successfully for user: {}", user.username);
            let token = create_jwt(&state.config, user.id, &user.username).map_err(|e| {
                ApiError::Domain(crate::domain::DomainError::Internal(e))
            })?;
            Ok(Json(LoginResponse { token }))
        }
        _ => {
            tracing::warn!("Password verification failed for user: {}", user.username);
            Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
    }
}
