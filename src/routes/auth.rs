// ABOUTME: Account routes for registration, login, logout, and profile lookup
// ABOUTME: Validates input, hashes passwords off the runtime, and issues sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication routes
//!
//! Registration and login both end by issuing an opaque session token.
//! Password hashing and verification run in `spawn_blocking` so PBKDF2 does
//! not stall the async runtime.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{error_messages, limits};
use crate::crypto;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use crate::storage::StorageProvider;

/// Registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request; `username` also accepts the account email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Sanitized user info returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub credits: i64,
    pub subscription_status: String,
}

impl UserInfo {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            credits: user.credits,
            subscription_status: user.subscription_status.as_str().to_owned(),
        }
    }
}

/// Session response for register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

/// Simple acknowledgement response
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

/// Authentication route group
pub struct AuthRoutes;

impl AuthRoutes {
    /// Build the `/api/auth` router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/me", get(me))
            .with_state(resources)
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    if request.username.trim().is_empty() {
        return Err(AppError::invalid_input("Username must not be empty"));
    }
    if !request.email.contains('@') || !request.email.contains('.') {
        return Err(AppError::invalid_input(
            error_messages::INVALID_EMAIL_FORMAT,
        ));
    }
    if request.password.len() < limits::MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid_input(error_messages::PASSWORD_TOO_WEAK));
    }
    Ok(())
}

async fn register(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<SessionResponse>> {
    validate_registration(&request)?;

    let username = request.username.trim().to_owned();
    let email = request.email.trim().to_lowercase();

    if resources
        .storage
        .get_user_by_username(&username)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .is_some()
    {
        return Err(AppError::already_exists(
            error_messages::USERNAME_ALREADY_EXISTS,
        ));
    }
    if resources
        .storage
        .get_user_by_email(&email)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .is_some()
    {
        return Err(AppError::already_exists(
            error_messages::EMAIL_ALREADY_EXISTS,
        ));
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || crypto::hash_password(&password))
        .await
        .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?;

    let user = User::new(username, email, password_hash);
    resources
        .storage
        .create_user(&user)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

    info!(user_id = %user.id, "registered new user");

    let session = resources.sessions.issue_session(&user).await?;
    Ok(Json(SessionResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
        user: UserInfo::from_user(&user),
    }))
}

async fn login(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let identifier = request.username.trim();

    let user = match resources
        .storage
        .get_user_by_username(identifier)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
    {
        Some(user) => Some(user),
        None => resources
            .storage
            .get_user_by_email(&identifier.to_lowercase())
            .await
            .map_err(|e| AppError::database(e.to_string()))?,
    };

    // Same error for unknown user and wrong password
    let user = user.ok_or_else(|| AppError::auth_invalid(error_messages::INVALID_CREDENTIALS))?;

    let password = request.password;
    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || crypto::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Stored password hash is invalid: {e}")))?;

    if !valid {
        return Err(AppError::auth_invalid(error_messages::INVALID_CREDENTIALS));
    }

    let session = resources.sessions.issue_session(&user).await?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(SessionResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
        user: UserInfo::from_user(&user),
    }))
}

async fn logout(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<AckResponse>> {
    let auth = authenticate(&resources, &headers).await?;
    resources.sessions.revoke(&auth.token).await?;
    Ok(Json(AckResponse {
        success: true,
        message: "Logged out".to_owned(),
    }))
}

async fn me(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<UserInfo>> {
    let auth = authenticate(&resources, &headers).await?;
    Ok(Json(UserInfo::from_user(&auth.user)))
}
