// ABOUTME: Conversational recipe assistant routes backed by persisted chat history
// ABOUTME: Replays prior turns into each completion and stores both sides of the exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat routes
//!
//! Each message is stored, the full conversation replayed to the model with
//! the assistant system prompt, and the reply stored and returned. Omitting
//! `conversationId` starts a new conversation.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatRequest};
use crate::models::{ChatMessageRecord, ConversationSummary};
use crate::resources::ServerResources;
use crate::routes::authenticate;
use crate::storage::StorageProvider;

/// Chat message request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    /// Existing conversation, or absent to start a new one
    pub conversation_id: Option<String>,
    pub message: String,
}

/// Chat reply response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub conversation_id: String,
    pub reply: String,
}

/// One stored message rendered for clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Chat route group
pub struct ChatRoutes;

impl ChatRoutes {
    /// Build the `/api/chat` router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/messages", post(send_message))
            .route("/api/chat/conversations", get(list_conversations))
            .route(
                "/api/chat/conversations/:id/messages",
                get(conversation_messages),
            )
            .route(
                "/api/chat/conversations/:id",
                axum::routing::delete(delete_conversation),
            )
            .with_state(resources)
    }
}

fn parse_conversation_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::invalid_input("Conversation id must be a UUID"))
}

async fn send_message(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<ChatMessageRequest>,
) -> AppResult<Json<ChatMessageResponse>> {
    let auth = authenticate(&resources, &headers).await?;

    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::invalid_input("Message must not be empty"));
    }

    let conversation_id = match &request.conversation_id {
        Some(id) => parse_conversation_id(id)?,
        None => Uuid::new_v4(),
    };

    let history = resources
        .storage
        .get_chat_messages(auth.user.id, conversation_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    resources
        .storage
        .create_chat_message(&ChatMessageRecord {
            id: Uuid::new_v4(),
            user_id: auth.user.id,
            conversation_id,
            role: "user".to_owned(),
            content: message.to_owned(),
            created_at: Utc::now(),
        })
        .await
        .map_err(|e| AppError::database(format!("Failed to store message: {e}")))?;

    let mut llm_messages = vec![ChatMessage::system(prompts::chat_system_prompt())];
    for record in &history {
        if record.role == "assistant" {
            llm_messages.push(ChatMessage::assistant(record.content.clone()));
        } else {
            llm_messages.push(ChatMessage::user(record.content.clone()));
        }
    }
    llm_messages.push(ChatMessage::user(message));

    let response = resources
        .llm
        .complete(&ChatRequest::new(llm_messages))
        .await?;

    resources
        .storage
        .create_chat_message(&ChatMessageRecord {
            id: Uuid::new_v4(),
            user_id: auth.user.id,
            conversation_id,
            role: "assistant".to_owned(),
            content: response.content.clone(),
            created_at: Utc::now(),
        })
        .await
        .map_err(|e| AppError::database(format!("Failed to store reply: {e}")))?;

    Ok(Json(ChatMessageResponse {
        conversation_id: conversation_id.to_string(),
        reply: response.content,
    }))
}

async fn list_conversations(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let auth = authenticate(&resources, &headers).await?;
    let conversations = resources
        .storage
        .get_conversations(auth.user.id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(conversations))
}

async fn conversation_messages(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<StoredMessage>>> {
    let auth = authenticate(&resources, &headers).await?;
    let conversation_id = parse_conversation_id(&id)?;

    let messages = resources
        .storage
        .get_chat_messages(auth.user.id, conversation_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if messages.is_empty() {
        return Err(AppError::not_found("Conversation"));
    }

    Ok(Json(
        messages
            .into_iter()
            .map(|m| StoredMessage {
                id: m.id.to_string(),
                role: m.role,
                content: m.content,
                created_at: m.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}

async fn delete_conversation(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let auth = authenticate(&resources, &headers).await?;
    let conversation_id = parse_conversation_id(&id)?;

    let messages = resources
        .storage
        .get_chat_messages(auth.user.id, conversation_id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    if messages.is_empty() {
        return Err(AppError::not_found("Conversation"));
    }

    resources
        .storage
        .delete_conversation(auth.user.id, conversation_id)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;
    Ok(Json(serde_json::json!({ "success": true })))
}
