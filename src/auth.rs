// ABOUTME: Session issuance and bearer-token authentication
// ABOUTME: Opaque random tokens stored server-side with sliding last-active tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Authentication and Session Management
//!
//! Sessions are opaque random tokens stored server-side; the client presents
//! them as `Authorization: Bearer <token>`. Expired sessions are deleted on
//! first use after expiry.

use crate::crypto::generate_session_token;
use crate::errors::AppError;
use crate::models::{User, UserSession};
use crate::storage::{Storage, StorageProvider};
use chrono::{Duration, Utc};
use tracing::{debug, warn};

/// Successful authentication outcome
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The authenticated user
    pub user: User,
    /// The session token that authenticated this request
    pub token: String,
}

/// Issues and validates sessions against the storage backend
#[derive(Clone)]
pub struct SessionManager {
    storage: Storage,
    expiry_hours: i64,
}

impl SessionManager {
    #[must_use]
    pub const fn new(storage: Storage, expiry_hours: i64) -> Self {
        Self {
            storage,
            expiry_hours,
        }
    }

    /// Issue a new session for a user who has just proven their identity
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub async fn issue_session(&self, user: &User) -> Result<UserSession, AppError> {
        let now = Utc::now();
        let session = UserSession {
            token: generate_session_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + Duration::hours(self.expiry_hours),
        };
        self.storage
            .create_session(&session)
            .await
            .map_err(|e| AppError::database(format!("Failed to store session: {e}")))?;
        debug!(user_id = %user.id, "issued session");
        Ok(session)
    }

    /// Authenticate a request from its `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns `auth_required` when the header is missing, `auth_invalid`
    /// for malformed headers or unknown tokens, and `auth_expired` for
    /// sessions past their expiry (which are deleted as a side effect).
    pub async fn authenticate(&self, auth_header: Option<&str>) -> Result<AuthResult, AppError> {
        let header = auth_header.ok_or_else(AppError::auth_required)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must use Bearer scheme"))?
            .trim();
        if token.is_empty() {
            return Err(AppError::auth_invalid("Empty bearer token"));
        }

        let session = self
            .storage
            .get_session_by_token(token)
            .await
            .map_err(|e| AppError::database(format!("Session lookup failed: {e}")))?
            .ok_or_else(|| AppError::auth_invalid("Unknown or revoked session token"))?;

        if session.is_expired() {
            if let Err(e) = self.storage.delete_session(token).await {
                warn!("failed to delete expired session: {e}");
            }
            return Err(AppError::auth_expired());
        }

        let mut user = self
            .storage
            .get_user(session.user_id)
            .await
            .map_err(|e| AppError::database(format!("User lookup failed: {e}")))?
            .ok_or_else(|| AppError::auth_invalid("Session references a deleted user"))?;

        user.last_active = Utc::now();
        if let Err(e) = self.storage.update_user(&user).await {
            warn!(user_id = %user.id, "failed to update last_active: {e}");
        }

        Ok(AuthResult {
            user,
            token: token.to_owned(),
        })
    }

    /// Revoke a session (logout). Revoking an unknown token is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage backend fails.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.storage
            .delete_session(token)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete session: {e}")))
    }
}
