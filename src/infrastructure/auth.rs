use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::infrastructure::AppState;
use crate::infrastructure::config::Config;

pub const LOGIN_URL: &str = "/accounts/login/";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub uid: i32,
    pub exp: usize,
}

/// The authenticated caller with the capabilities resolved at request time.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    /// Superusers implicitly hold every capability.
    pub fn has_perm(&self, codename: &str) -> bool {
        self.is_superuser || self.permissions.iter().any(|p| p == codename)
    }

    pub fn require_perm(&self, codename: &str) -> Result<(), ApiError> {
        if self.has_perm(codename) {
            Ok(())
        } else {
            tracing::warn!("User {} lacks capability {}", self.username, codename);
            Err(ApiError::Forbidden)
        }
    }
}

/// Resolves the caller if a valid token is presented; anonymous otherwise.
pub struct MaybeUser(pub Option<CurrentUser>);

/// Requires an authenticated caller, redirecting anonymous requests to the login page.
pub struct LoginRequired(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };

        let claims = match decode_jwt(&state.config, token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected token: {}", e);
                return Ok(MaybeUser(None));
            }
        };

        let Some(user) = state.user_repo.find_by_id(claims.uid).await? else {
            return Ok(MaybeUser(None));
        };
        let permissions = state.user_repo.permissions(user.id).await?;

        Ok(MaybeUser(Some(CurrentUser {
            id: user.id,
            username: user.username,
            is_superuser: user.is_superuser,
            permissions,
        })))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for LoginRequired {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(LoginRequired(user)),
            MaybeUser(None) => Err(ApiError::LoginRequired {
                next: original_path(parts),
            }),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// Nested routers see a stripped URI; the login redirect needs the full path.
fn original_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// `/accounts/login/?next=<path>` with `/` left unescaped.
pub fn login_redirect_url(next: &str) -> String {
    format!(
        "{}?next={}",
        LOGIN_URL,
        urlencoding::encode(next).replace("%2F", "/")
    )
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_jwt(config: &Config, user_id: i32, username: &str) -> Result<String, String> {
    let secret = config.signing_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or("timestamp overflow")?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(config: &Config, token: &str) -> Result<Claims, String> {
    let secret = config.signing_secret()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect_url("/catalog/author/create/"),
            "/accounts/login/?next=/catalog/author/create/"
        );
        assert_eq!(
            login_redirect_url("/catalog/mybooks/?page=2"),
            "/accounts/login/?next=/catalog/mybooks/%3Fpage%3D2"
        );
    }

    #[test]
    fn superuser_holds_every_capability() {
        let user = CurrentUser {
            id: 1,
            username: "root".to_string(),
            is_superuser: true,
            permissions: vec![],
        };
        assert!(user.has_perm("add_author"));
    }

    #[test]
    fn capabilities_are_matched_exactly() {
        let user = CurrentUser {
            id: 2,
            username: "clerk".to_string(),
            is_superuser: false,
            permissions: vec!["add_author".to_string()],
        };
        assert!(user.has_perm("add_author"));
        assert!(!user.has_perm("change_author"));
        assert!(matches!(user.require_perm("delete_author"), Err(ApiError::Forbidden)));
    }

    #[test]
    fn tokens_only_verify_under_the_signing_secret() {
        let issuer = Config {
            jwt_secret: Some("first".to_string()),
            ..Config::default()
        };
        let other = Config {
            jwt_secret: Some("second".to_string()),
            ..Config::default()
        };

        let token = create_jwt(&issuer, 3, "clerk").unwrap();
        assert_eq!(decode_jwt(&issuer, &token).unwrap().uid, 3);
        assert!(decode_jwt(&other, &token).is_err());
    }
}
