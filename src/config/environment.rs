// ABOUTME: Environment-driven server configuration with startup summary
// ABOUTME: Reads ports, database URL, API keys, and limits from the process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server configuration loaded from environment variables
//!
//! | Variable | Default | Purpose |
//! |---|---|---|
//! | `HTTP_PORT` | `8081` | HTTP listen port |
//! | `DATABASE_URL` | `sqlite:data/dish_detective.db` | storage backend selector |
//! | `GEMINI_API_KEY` | — | Generative Language API key (required for AI routes) |
//! | `YOUTUBE_API_KEY` | — | YouTube Data API key (optional, enrichment disabled without it) |
//! | `STRIPE_SECRET_KEY` | — | Stripe secret key (optional, billing disabled without it) |
//! | `STRIPE_WEBHOOK_SECRET` | — | Stripe webhook signing secret |
//! | `CORS_ALLOWED_ORIGINS` | `*` | comma-separated allowed origins |
//! | `MAX_BODY_BYTES` | 10 MiB | request body limit |
//! | `SESSION_EXPIRY_HOURS` | 168 | opaque session token lifetime |

use crate::constants::limits;
use anyhow::{Context, Result};
use std::env;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Storage connection string (`sqlite:...` or `memory:`)
    pub database_url: String,
    /// Gemini API key; AI routes fail with a config error when absent
    pub gemini_api_key: Option<String>,
    /// YouTube Data API key; video enrichment is skipped when absent
    pub youtube_api_key: Option<String>,
    /// Stripe secret key; billing routes are disabled when absent
    pub stripe_secret_key: Option<String>,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: Option<String>,
    /// Allowed CORS origins (`*` for any)
    pub cors_allowed_origins: Vec<String>,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
    /// Session token lifetime in hours
    pub session_expiry_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is present but unparsable.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .context("HTTP_PORT must be a valid port number")?,
            Err(_) => 8081,
        };

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:data/dish_detective.db".to_owned());

        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(value) => value
                .parse::<usize>()
                .context("MAX_BODY_BYTES must be a byte count")?,
            Err(_) => limits::MAX_BODY_BYTES,
        };

        let session_expiry_hours = match env::var("SESSION_EXPIRY_HOURS") {
            Ok(value) => value
                .parse::<i64>()
                .context("SESSION_EXPIRY_HOURS must be an integer")?,
            Err(_) => limits::SESSION_EXPIRY_HOURS,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_owned())
            .split(',')
            .map(|origin| origin.trim().to_owned())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            http_port,
            database_url,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            youtube_api_key: env::var("YOUTUBE_API_KEY").ok(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok(),
            cors_allowed_origins,
            max_body_bytes,
            session_expiry_hours,
        })
    }

    /// One-line summary for startup logging, secrets redacted
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} gemini_key={} youtube_key={} stripe={} body_limit={}B session_expiry={}h",
            self.http_port,
            self.database_url,
            presence(self.gemini_api_key.as_deref()),
            presence(self.youtube_api_key.as_deref()),
            presence(self.stripe_secret_key.as_deref()),
            self.max_body_bytes,
            self.session_expiry_hours,
        )
    }
}

fn presence(value: Option<&str>) -> &'static str {
    if value.is_some_and(|v| !v.is_empty()) {
        "set"
    } else {
        "unset"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_redacts_secrets() {
        let config = ServerConfig {
            http_port: 8081,
            database_url: "memory:".into(),
            gemini_api_key: Some("very-secret".into()),
            youtube_api_key: None,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            cors_allowed_origins: vec!["*".into()],
            max_body_bytes: 1024,
            session_expiry_hours: 24,
        };

        let summary = config.summary();
        assert!(!summary.contains("very-secret"));
        assert!(summary.contains("gemini_key=set"));
        assert!(summary.contains("youtube_key=unset"));
    }
}
