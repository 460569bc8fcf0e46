// ABOUTME: In-memory storage backend backed by dashmap
// ABOUTME: Non-persistent; used for development, demos, and the test suite
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage implementation
//!
//! All data lives in concurrent maps and is lost on restart. Secondary
//! lookups (username, email, conversation listings) are linear scans, which
//! is fine at the data volumes this backend is meant for.

use super::{conversation_title, StorageProvider};
use crate::models::{ChatMessageRecord, ConversationSummary, SavedRecipe, User, UserSession};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Non-persistent storage backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    users: Arc<DashMap<Uuid, User>>,
    sessions: Arc<DashMap<String, UserSession>>,
    recipes: Arc<DashMap<Uuid, SavedRecipe>>,
    messages: Arc<DashMap<Uuid, ChatMessageRecord>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<Uuid> {
        if self
            .users
            .iter()
            .any(|entry| entry.username == user.username)
        {
            return Err(anyhow!("username already in use"));
        }
        if self.users.iter().any(|entry| entry.email == user.email) {
            return Err(anyhow!("email already in use"));
        }
        self.users.insert(user.id, user.clone());
        Ok(user.id)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|entry| entry.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.clone()))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_session(&self, session: &UserSession) -> Result<()> {
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<UserSession>> {
        Ok(self.sessions.get(token).map(|entry| entry.clone()))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn get_saved_recipes(&self, user_id: Uuid) -> Result<Vec<SavedRecipe>> {
        let mut recipes: Vec<SavedRecipe> = self
            .recipes
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    async fn get_saved_recipe_by_id(&self, recipe_id: Uuid) -> Result<Option<SavedRecipe>> {
        Ok(self.recipes.get(&recipe_id).map(|entry| entry.clone()))
    }

    async fn create_saved_recipe(&self, recipe: &SavedRecipe) -> Result<Uuid> {
        self.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe.id)
    }

    async fn update_saved_recipe(&self, recipe: &SavedRecipe) -> Result<()> {
        self.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn delete_saved_recipe(&self, recipe_id: Uuid) -> Result<()> {
        self.recipes.remove(&recipe_id);
        Ok(())
    }

    async fn create_chat_message(&self, message: &ChatMessageRecord) -> Result<Uuid> {
        self.messages.insert(message.id, message.clone());
        Ok(message.id)
    }

    async fn get_chat_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<ChatMessageRecord>> {
        let mut messages: Vec<ChatMessageRecord> = self
            .messages
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.conversation_id == conversation_id)
            .map(|entry| entry.clone())
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn get_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        let mut by_conversation: std::collections::HashMap<Uuid, Vec<ChatMessageRecord>> =
            std::collections::HashMap::new();
        for entry in self.messages.iter() {
            if entry.user_id == user_id {
                by_conversation
                    .entry(entry.conversation_id)
                    .or_default()
                    .push(entry.clone());
            }
        }

        let mut summaries: Vec<ConversationSummary> = by_conversation
            .into_iter()
            .map(|(conversation_id, mut messages)| {
                messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                let first_user_message = messages
                    .iter()
                    .find(|message| message.role == "user")
                    .map_or("", |message| message.content.as_str());
                ConversationSummary {
                    conversation_id,
                    title: conversation_title(first_user_message),
                    message_count: messages.len() as i64,
                    updated_at: messages
                        .last()
                        .map_or_else(chrono::Utc::now, |message| message.created_at),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        self.messages
            .retain(|_, message| {
                !(message.user_id == user_id && message.conversation_id == conversation_id)
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(name: &str) -> User {
        User::new(
            name.to_owned(),
            format!("{name}@example.com"),
            "pbkdf2$1$aa$bb".to_owned(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let storage = MemoryStorage::new();
        storage.create_user(&sample_user("alice")).await.unwrap();

        let mut dup = sample_user("alice");
        dup.email = "other@example.com".to_owned();
        assert!(storage.create_user(&dup).await.is_err());
    }

    #[tokio::test]
    async fn test_conversation_listing_groups_messages() {
        let storage = MemoryStorage::new();
        let user_id = Uuid::new_v4();
        let conversation_id = Uuid::new_v4();

        for (role, content) in [("user", "Make me pasta"), ("assistant", "Here is a recipe")] {
            storage
                .create_chat_message(&ChatMessageRecord {
                    id: Uuid::new_v4(),
                    user_id,
                    conversation_id,
                    role: role.to_owned(),
                    content: content.to_owned(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let conversations = storage.get_conversations(user_id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].message_count, 2);
        assert_eq!(conversations[0].title, "Make me pasta");

        storage
            .delete_conversation(user_id, conversation_id)
            .await
            .unwrap();
        assert!(storage.get_conversations(user_id).await.unwrap().is_empty());
    }
}
