// ABOUTME: Shared server resources passed to every route group
// ABOUTME: Single construction point for storage, sessions, AI, and billing clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Server Resources
//!
//! One `Arc<ServerResources>` is built at startup and shared by all route
//! groups, so each collaborator is constructed exactly once.

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use crate::external::{StripeClient, VideoSearch};
use crate::llm::LlmProvider;
use crate::storage::Storage;

/// Container for all shared server dependencies
pub struct ServerResources {
    /// Storage backend (SQLite or in-memory)
    pub storage: Storage,
    /// Session issuance and bearer-token validation
    pub sessions: SessionManager,
    /// Generative AI provider
    pub llm: Arc<dyn LlmProvider>,
    /// Related-video search, best effort
    pub video_search: Arc<dyn VideoSearch>,
    /// Stripe billing client; `None` disables the billing routes' actions
    pub stripe: Option<StripeClient>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Bundle the shared dependencies for route handlers
    #[must_use]
    pub fn new(
        storage: Storage,
        llm: Arc<dyn LlmProvider>,
        video_search: Arc<dyn VideoSearch>,
        stripe: Option<StripeClient>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let sessions = SessionManager::new(storage.clone(), config.session_expiry_hours);
        Self {
            storage,
            sessions,
            llm,
            video_search,
            stripe,
            config,
        }
    }
}
