// ABOUTME: External service clients consumed by the application layer
// ABOUTME: Video search and payment processing behind narrow interfaces
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # External Services
//!
//! Clients for collaborators outside the AI provider: YouTube video search
//! (best-effort enrichment, failures never fail the request) and Stripe
//! billing (checkout sessions plus signature-verified webhooks).

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::Video;

pub mod stripe;
pub mod youtube;

pub use stripe::{BillingPlan, CheckoutSession, StripeClient, StripeEvent};
pub use youtube::{DisabledVideoSearch, YouTubeClient};

/// Video-search abstraction used for recipe enrichment
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Search for up to `limit` videos matching `query`
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Video>, AppError>;
}
