// ABOUTME: Application constants and configuration limits
// ABOUTME: Central place for session expiry, payload limits, and billing plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application-wide constants

/// Limits applied across the service
pub mod limits {
    /// Default opaque session token lifetime
    pub const SESSION_EXPIRY_HOURS: i64 = 24 * 7;

    /// Default maximum request body size (base64 food photos are large)
    pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

    /// Maximum related videos attached to a recipe analysis
    pub const MAX_RELATED_VIDEOS: usize = 5;

    /// Minimum accepted password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
}

/// Common error message strings
pub mod error_messages {
    pub const USERNAME_ALREADY_EXISTS: &str = "Username already exists";
    pub const EMAIL_ALREADY_EXISTS: &str = "Email already registered";
    pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email address format";
    pub const PASSWORD_TOO_WEAK: &str = "Password must be at least 8 characters";
}

/// Billing plan identifiers and amounts (USD cents)
pub mod billing {
    /// Monthly subscription plan
    pub const PLAN_PREMIUM_MONTHLY: &str = "premium-monthly";
    pub const PREMIUM_MONTHLY_CENTS: u64 = 999;

    /// One-time credit packs
    pub const PLAN_CREDITS_SMALL: &str = "credits-10";
    pub const CREDITS_SMALL_CENTS: u64 = 299;
    pub const CREDITS_SMALL_AMOUNT: i64 = 10;

    pub const PLAN_CREDITS_LARGE: &str = "credits-50";
    pub const CREDITS_LARGE_CENTS: u64 = 999;
    pub const CREDITS_LARGE_AMOUNT: i64 = 50;
}

/// Service identity for logging
pub mod service_names {
    pub const DISH_DETECTIVE: &str = "dish-detective";
}
