// ABOUTME: Storage abstraction layer for Dish Detective
// ABOUTME: Plugin architecture with SQLite and in-memory backends behind one trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage abstraction
//!
//! All backends implement [`StorageProvider`] to give the application layer
//! one consistent interface; the concrete backend is chosen at process start
//! from the connection string (see [`factory`]).

use crate::models::{ChatMessageRecord, ConversationSummary, SavedRecipe, User, UserSession};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod factory;
pub mod memory;
pub mod sqlite;

pub use factory::Storage;

/// Core storage abstraction trait
///
/// Uniqueness contract: `username` and `email` are unique across users;
/// `create_user` fails when either is already taken.
#[async_trait]
pub trait StorageProvider: Send + Sync + Clone {
    /// Run schema migrations (no-op for backends without schemas)
    async fn migrate(&self) -> Result<()>;

    // ================================
    // User Management
    // ================================

    /// Create a new user account
    async fn create_user(&self, user: &User) -> Result<Uuid>;

    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Get user by login name
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email address
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist updated user fields (credits, subscription, last active)
    async fn update_user(&self, user: &User) -> Result<()>;

    // ================================
    // Session Management
    // ================================

    /// Store a newly issued session
    async fn create_session(&self, session: &UserSession) -> Result<()>;

    /// Look up a session by its opaque token
    async fn get_session_by_token(&self, token: &str) -> Result<Option<UserSession>>;

    /// Delete a session (logout or expiry)
    async fn delete_session(&self, token: &str) -> Result<()>;

    // ================================
    // Saved Recipes
    // ================================

    /// List a user's saved recipes, newest first
    async fn get_saved_recipes(&self, user_id: Uuid) -> Result<Vec<SavedRecipe>>;

    /// Get one saved recipe by ID
    async fn get_saved_recipe_by_id(&self, recipe_id: Uuid) -> Result<Option<SavedRecipe>>;

    /// Save a recipe analysis
    async fn create_saved_recipe(&self, recipe: &SavedRecipe) -> Result<Uuid>;

    /// Update a saved recipe (title or analysis payload)
    async fn update_saved_recipe(&self, recipe: &SavedRecipe) -> Result<()>;

    /// Delete a saved recipe
    async fn delete_saved_recipe(&self, recipe_id: Uuid) -> Result<()>;

    // ================================
    // Chat History
    // ================================

    /// Append a chat message
    async fn create_chat_message(&self, message: &ChatMessageRecord) -> Result<Uuid>;

    /// Get all messages of one conversation, oldest first
    async fn get_chat_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessageRecord>>;

    /// List a user's conversations, most recently active first
    async fn get_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>>;

    /// Delete a conversation and all of its messages
    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()>;
}

/// Derive a listing title from the first user message of a conversation
pub(crate) fn conversation_title(first_message: &str) -> String {
    const MAX_TITLE_CHARS: usize = 60;
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return "New conversation".to_owned();
    }
    if trimmed.chars().count() <= MAX_TITLE_CHARS {
        trimmed.to_owned()
    } else {
        let truncated: String = trimmed.chars().take(MAX_TITLE_CHARS).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_title_truncates() {
        assert_eq!(conversation_title("  How do I make pho?  "), "How do I make pho?");
        assert_eq!(conversation_title(""), "New conversation");
        let long = "x".repeat(80);
        let title = conversation_title(&long);
        assert_eq!(title.chars().count(), 61);
        assert!(title.ends_with('…'));
    }
}
