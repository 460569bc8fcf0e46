// ABOUTME: Storage factory with automatic backend detection from connection strings
// ABOUTME: Provides a unified Storage enum delegating to SQLite or in-memory backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage factory
//!
//! Detects the backend from the connection string: `sqlite:` selects the
//! SQLite backend, `memory:` the in-memory backend used for development and
//! tests.

use super::memory::MemoryStorage;
use super::sqlite::SqliteStorage;
use super::StorageProvider;
use crate::models::{ChatMessageRecord, ConversationSummary, SavedRecipe, User, UserSession};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Sqlite,
    Memory,
}

/// Storage instance wrapper that delegates to the configured backend
#[derive(Clone)]
pub enum Storage {
    Sqlite(SqliteStorage),
    Memory(MemoryStorage),
}

impl Storage {
    /// Create a storage instance based on the connection string
    ///
    /// # Errors
    ///
    /// Returns an error if the URL format is unsupported or the backend
    /// fails to initialize.
    pub async fn new(database_url: &str) -> Result<Self> {
        match detect_storage_type(database_url)? {
            StorageType::Sqlite => {
                let storage = SqliteStorage::new(database_url).await?;
                info!("SQLite storage initialized");
                Ok(Self::Sqlite(storage))
            }
            StorageType::Memory => {
                info!("In-memory storage initialized");
                Ok(Self::Memory(MemoryStorage::new()))
            }
        }
    }

    /// Descriptive string for the active backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLite",
            Self::Memory(_) => "In-Memory (non-persistent)",
        }
    }
}

/// Detect the storage backend from a connection string
///
/// # Errors
///
/// Returns an error for unrecognized URL schemes.
pub fn detect_storage_type(database_url: &str) -> Result<StorageType> {
    if database_url.starts_with("sqlite:") {
        Ok(StorageType::Sqlite)
    } else if database_url.starts_with("memory:") {
        Ok(StorageType::Memory)
    } else {
        Err(anyhow!(
            "Unsupported storage URL: {database_url}. \
             Supported formats: sqlite:path/to/db.sqlite, memory:"
        ))
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Storage::Sqlite(storage) => storage.$method($($arg),*).await,
            Storage::Memory(storage) => storage.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl StorageProvider for Storage {
    async fn migrate(&self) -> Result<()> {
        delegate!(self, migrate)
    }

    async fn create_user(&self, user: &User) -> Result<Uuid> {
        delegate!(self, create_user, user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        delegate!(self, get_user, user_id)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        delegate!(self, get_user_by_username, username)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        delegate!(self, get_user_by_email, email)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        delegate!(self, update_user, user)
    }

    async fn create_session(&self, session: &UserSession) -> Result<()> {
        delegate!(self, create_session, session)
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<UserSession>> {
        delegate!(self, get_session_by_token, token)
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        delegate!(self, delete_session, token)
    }

    async fn get_saved_recipes(&self, user_id: Uuid) -> Result<Vec<SavedRecipe>> {
        delegate!(self, get_saved_recipes, user_id)
    }

    async fn get_saved_recipe_by_id(&self, recipe_id: Uuid) -> Result<Option<SavedRecipe>> {
        delegate!(self, get_saved_recipe_by_id, recipe_id)
    }

    async fn create_saved_recipe(&self, recipe: &SavedRecipe) -> Result<Uuid> {
        delegate!(self, create_saved_recipe, recipe)
    }

    async fn update_saved_recipe(&self, recipe: &SavedRecipe) -> Result<()> {
        delegate!(self, update_saved_recipe, recipe)
    }

    async fn delete_saved_recipe(&self, recipe_id: Uuid) -> Result<()> {
        delegate!(self, delete_saved_recipe, recipe_id)
    }

    async fn create_chat_message(&self, message: &ChatMessageRecord) -> Result<Uuid> {
        delegate!(self, create_chat_message, message)
    }

    async fn get_chat_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessageRecord>> {
        delegate!(self, get_chat_messages, user_id, conversation_id)
    }

    async fn get_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        delegate!(self, get_conversations, user_id)
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        delegate!(self, delete_conversation, user_id, conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_storage_type() {
        assert_eq!(
            detect_storage_type("sqlite:data/app.db").unwrap(),
            StorageType::Sqlite
        );
        assert_eq!(detect_storage_type("memory:").unwrap(), StorageType::Memory);
        assert!(detect_storage_type("postgresql://host/db").is_err());
    }
}
