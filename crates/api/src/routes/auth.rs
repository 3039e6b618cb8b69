//! Registration and login.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use tradepost_core::{Email, RoleSet};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::NewUser;
use crate::response::ApiResponse;
use crate::services::{hash_password, verify_password};
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub address: Option<String>,
    pub phone: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Data payload returned on successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub email: Email,
    pub roles: RoleSet,
}

/// Data payload returned on successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub email: Email,
    pub roles: RoleSet,
    pub access_token: String,
    pub refresh_token: String,
}

fn require_field(value: &str, name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{name} is required")));
    }
    Ok(trimmed.to_owned())
}

/// Create a SELLER account.
///
/// Registering an email that already exists (case-insensitively) fails with
/// a conflict and leaves the existing account untouched.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let first_name = require_field(&body.firstname, "firstname")?;
    let last_name = require_field(&body.lastname, "lastname")?;
    let phone = require_field(&body.phone, "phone")?;

    let email = Email::parse(&body.email).map_err(|e| AppError::Validation(e.to_string()))?;

    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let password_hash = hash_password(&body.password)?;

    let new_user = NewUser {
        first_name,
        last_name,
        address: body.address.filter(|a| !a.trim().is_empty()),
        phone,
        email,
        roles: RoleSet::seller(),
    };

    let user = UserRepository::new(state.pool())
        .create(&new_user, &password_hash)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                AppError::Conflict("Email already registered".to_owned())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "user registered");

    let data = RegisterData {
        email: user.email,
        roles: user.roles,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data("User registered", data)),
    ))
}

/// Verify credentials and issue access + refresh tokens.
///
/// An unknown email and a wrong password are indistinguishable to the
/// caller: both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let invalid = || AppError::Unauthenticated("Invalid credentials".to_owned());

    let email = Email::parse(&body.email).map_err(|_| invalid())?;

    let (user, password_hash) = UserRepository::new(state.pool())
        .get_with_password(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&body.password, &password_hash) {
        return Err(invalid());
    }

    let access_token = state.tokens().issue_access(user.id, &user.roles)?;
    let refresh_token = state.tokens().issue_refresh(user.id, &user.roles)?;

    tracing::info!(user_id = %user.id, "user logged in");

    let data = LoginData {
        email: user.email,
        roles: user.roles,
        access_token,
        refresh_token,
    };

    Ok(Json(ApiResponse::with_data("success", data)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_trims() {
        assert_eq!(require_field("  Amal ", "firstname").unwrap(), "Amal");
    }

    #[test]
    fn test_require_field_rejects_blank() {
        let err = require_field("   ", "phone").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_login_data_wire_names() {
        let data = LoginData {
            email: Email::parse("a@b.c").unwrap(),
            roles: RoleSet::seller(),
            access_token: "at".to_owned(),
            refresh_token: "rt".to_owned(),
        };
        let json = serde_json::to_value(data).unwrap();
        assert_eq!(json["accessToken"], "at");
        assert_eq!(json["refreshToken"], "rt");
        assert_eq!(json["roles"][0], "SELLER");
    }
}
