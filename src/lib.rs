// ABOUTME: Main library entry point for the Dish Detective recipe platform
// ABOUTME: Provides REST APIs for AI recipe analysis, meal planning, and billing
//
// SPDX-License-Identifier: MIT OR Apache-2.0

#![deny(unsafe_code)]

//! # Dish Detective
//!
//! A web service that turns a food photo (or a free-text prompt) into a
//! structured recipe analysis using a generative AI model, with user
//! accounts, saved-recipe libraries, a chat-based recipe generator, meal
//! planning, and Stripe-backed subscriptions.
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **Normalizer**: repairs and coerces loosely-structured AI output into
//!   the `RecipeAnalysis` schema
//! - **Meal plans**: AI-generated plans with a deterministic template
//!   fallback when the AI path fails
//! - **Storage**: pluggable backends (SQLite, in-memory) behind one trait
//! - **LLM**: provider abstraction over the Gemini Generative Language API
//! - **External**: YouTube video search and Stripe billing clients
//!
//! ## Example
//!
//! ```rust,no_run
//! use dish_detective::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Dish Detective configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Opaque bearer-token session management
pub mod auth;

/// Configuration management
pub mod config;

/// Application constants and limits
pub mod constants;

/// Password hashing and token generation
pub mod crypto;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// External API clients (YouTube video search, Stripe billing)
pub mod external;

/// LLM provider abstraction for AI recipe generation
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Meal plan generation and the template fallback generator
pub mod mealplan;

/// Common data models: persistence entities and the recipe wire schema
pub mod models;

/// AI-response normalization: JSON repair and schema coercion
pub mod normalizer;

/// Dependency-injected server resources shared across handlers
pub mod resources;

/// HTTP routes organized by domain
pub mod routes;

/// Router assembly and HTTP server entry point
pub mod server;

/// Storage abstraction layer with pluggable backends
pub mod storage;
