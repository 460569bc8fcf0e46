// ABOUTME: Server binary wiring configuration, storage, and external clients together
// ABOUTME: Starts the HTTP API and logs the available endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Dish Detective Server Binary
//!
//! Loads configuration from the environment, initializes the storage
//! backend and external clients, and serves the HTTP API.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use dish_detective::config::ServerConfig;
use dish_detective::external::{DisabledVideoSearch, StripeClient, VideoSearch, YouTubeClient};
use dish_detective::llm::{GeminiProvider, LlmProvider};
use dish_detective::logging;
use dish_detective::resources::ServerResources;
use dish_detective::server;
use dish_detective::storage::{Storage, StorageProvider};

#[derive(Parser)]
#[command(name = "dish-detective")]
#[command(about = "Dish Detective - food photo analysis and recipe generation API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Dish Detective API");
    info!("{}", config.summary());

    let storage = Storage::new(&config.database_url).await?;
    storage.migrate().await?;
    info!("Storage ready: {}", storage.backend_info());

    let llm: Arc<dyn LlmProvider> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiProvider::new(key.clone())),
        None => {
            warn!("GEMINI_API_KEY is not set; AI routes will fail until it is configured");
            Arc::new(GeminiProvider::new(String::new()))
        }
    };

    let video_search: Arc<dyn VideoSearch> = match &config.youtube_api_key {
        Some(key) => Arc::new(YouTubeClient::new(key.clone())),
        None => {
            warn!("YOUTUBE_API_KEY is not set; video enrichment is disabled");
            Arc::new(DisabledVideoSearch)
        }
    };

    let stripe = config
        .stripe_secret_key
        .as_ref()
        .map(|key| StripeClient::new(key.clone(), config.stripe_webhook_secret.clone()));
    if stripe.is_none() {
        warn!("STRIPE_SECRET_KEY is not set; billing routes are disabled");
    }

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        storage,
        llm,
        video_search,
        stripe,
        Arc::new(config),
    ));

    info!("Available endpoints:");
    info!("  GET  /health");
    info!("  POST /api/auth/register | /api/auth/login | /api/auth/logout");
    info!("  GET  /api/auth/me");
    info!("  POST /api/analyze | /api/recipes/generate");
    info!("  CRUD /api/recipes[/:id]");
    info!("  CHAT /api/chat/messages | /api/chat/conversations[/:id]");
    info!("  POST /api/meal-plans");
    info!("  BILL /api/billing/checkout | /api/billing/webhook | /api/billing/status");
    info!("Listening on http://0.0.0.0:{port}");

    server::run(resources).await
}
