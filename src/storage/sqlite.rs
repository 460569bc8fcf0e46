// ABOUTME: SQLite storage backend implemented with sqlx
// ABOUTME: Inline schema migrations and row mapping for all storage entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite storage implementation
//!
//! Persistent backend for single-node deployments. Schema is created with
//! `CREATE TABLE IF NOT EXISTS` statements at startup; timestamps are stored
//! as RFC 3339 text, IDs as text UUIDs.

use super::{conversation_title, StorageProvider};
use crate::models::{
    ChatMessageRecord, ConversationSummary, SavedRecipe, SubscriptionStatus, User, UserSession,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

/// SQLite storage backend
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to (and create if missing) the SQLite database at `database_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the pool cannot connect.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("invalid sqlite connection string")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("failed to open sqlite database")?;

        Ok(Self { pool })
    }

    fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id: String = row.try_get("id")?;
        let status: String = row.try_get("subscription_status")?;
        Ok(User {
            id: Uuid::parse_str(&id)?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            credits: row.try_get("credits")?,
            subscription_status: SubscriptionStatus::from_str_lossy(&status),
            stripe_customer_id: row.try_get("stripe_customer_id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            last_active: row.try_get::<DateTime<Utc>, _>("last_active")?,
        })
    }

    fn recipe_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SavedRecipe> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let analysis: String = row.try_get("analysis")?;
        Ok(SavedRecipe {
            id: Uuid::parse_str(&id)?,
            user_id: Uuid::parse_str(&user_id)?,
            title: row.try_get("title")?,
            analysis: serde_json::from_str(&analysis)
                .context("stored recipe analysis is not valid JSON")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessageRecord> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let conversation_id: String = row.try_get("conversation_id")?;
        Ok(ChatMessageRecord {
            id: Uuid::parse_str(&id)?,
            user_id: Uuid::parse_str(&user_id)?,
            conversation_id: Uuid::parse_str(&conversation_id)?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl StorageProvider for SqliteStorage {
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                credits INTEGER NOT NULL DEFAULT 3,
                subscription_status TEXT NOT NULL DEFAULT 'free'
                    CHECK (subscription_status IN ('free', 'premium', 'cancelled')),
                stripe_customer_id TEXT,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS saved_recipes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                analysis TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_saved_recipes_user ON saved_recipes(user_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation \
             ON chat_messages(user_id, conversation_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<Uuid> {
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(anyhow!("username already in use"));
        }
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("email already in use"));
        }

        sqlx::query(
            r"
            INSERT INTO users (
                id, username, email, password_hash, credits,
                subscription_status, stripe_customer_id, created_at, last_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.credits)
        .bind(user.subscription_status.as_str())
        .bind(&user.stripe_customer_id)
        .bind(user.created_at)
        .bind(user.last_active)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                credits = $4,
                subscription_status = $5,
                stripe_customer_id = $6,
                last_active = $7
            WHERE id = $1
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.credits)
        .bind(user.subscription_status.as_str())
        .bind(&user.stripe_customer_id)
        .bind(user.last_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_session(&self, session: &UserSession) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id.to_string())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<UserSession>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let user_id: String = row.try_get("user_id")?;
            Ok(UserSession {
                token: row.try_get("token")?,
                user_id: Uuid::parse_str(&user_id)?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                expires_at: row.try_get::<DateTime<Utc>, _>("expires_at")?,
            })
        })
        .transpose()
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_saved_recipes(&self, user_id: Uuid) -> Result<Vec<SavedRecipe>> {
        let rows =
            sqlx::query("SELECT * FROM saved_recipes WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(Self::recipe_from_row).collect()
    }

    async fn get_saved_recipe_by_id(&self, recipe_id: Uuid) -> Result<Option<SavedRecipe>> {
        let row = sqlx::query("SELECT * FROM saved_recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::recipe_from_row).transpose()
    }

    async fn create_saved_recipe(&self, recipe: &SavedRecipe) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO saved_recipes (id, user_id, title, analysis, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(recipe.id.to_string())
        .bind(recipe.user_id.to_string())
        .bind(&recipe.title)
        .bind(serde_json::to_string(&recipe.analysis)?)
        .bind(recipe.created_at)
        .execute(&self.pool)
        .await?;
        Ok(recipe.id)
    }

    async fn update_saved_recipe(&self, recipe: &SavedRecipe) -> Result<()> {
        sqlx::query("UPDATE saved_recipes SET title = $2, analysis = $3 WHERE id = $1")
            .bind(recipe.id.to_string())
            .bind(&recipe.title)
            .bind(serde_json::to_string(&recipe.analysis)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_saved_recipe(&self, recipe_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM saved_recipes WHERE id = $1")
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_chat_message(&self, message: &ChatMessageRecord) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO chat_messages (id, user_id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(message.id.to_string())
        .bind(message.user_id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(&message.role)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(message.id)
    }

    async fn get_chat_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM chat_messages
            WHERE user_id = $1 AND conversation_id = $2
            ORDER BY created_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::message_from_row).collect()
    }

    async fn get_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT
                conversation_id,
                COUNT(*) AS message_count,
                MAX(created_at) AS updated_at,
                (
                    SELECT content FROM chat_messages first_msg
                    WHERE first_msg.user_id = $1
                      AND first_msg.conversation_id = msgs.conversation_id
                      AND first_msg.role = 'user'
                    ORDER BY first_msg.created_at ASC
                    LIMIT 1
                ) AS title
            FROM chat_messages msgs
            WHERE user_id = $1
            GROUP BY conversation_id
            ORDER BY updated_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let conversation_id: String = row.try_get("conversation_id")?;
                let title: Option<String> = row.try_get("title")?;
                Ok(ConversationSummary {
                    conversation_id: Uuid::parse_str(&conversation_id)?,
                    title: conversation_title(title.as_deref().unwrap_or_default()),
                    message_count: row.try_get("message_count")?,
                    updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
                })
            })
            .collect()
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM chat_messages WHERE user_id = $1 AND conversation_id = $2")
            .bind(user_id.to_string())
            .bind(conversation_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
