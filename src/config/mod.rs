// ABOUTME: Configuration module organization for Dish Detective
// ABOUTME: Exposes environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management
//!
//! All configuration is sourced from environment variables at startup;
//! there is no configuration file layer.

pub mod environment;

pub use environment::ServerConfig;
