// ABOUTME: Thin Stripe REST client for checkout sessions and webhook verification
// ABOUTME: HMAC-SHA256 signature checks with a timestamp tolerance window
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stripe billing client
//!
//! Creates checkout sessions (subscription and one-time credit packs) via
//! form-encoded posts to the Stripe REST API and verifies webhook payloads
//! against the `Stripe-Signature` header. No retries; a failed call is
//! surfaced to the route layer.

use chrono::Utc;
use reqwest::Client;
use ring::hmac;
use serde::Deserialize;
use tracing::debug;

use crate::constants::billing;
use crate::errors::AppError;

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

/// Maximum accepted age of a webhook signature timestamp, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A purchasable plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingPlan {
    /// Monthly premium subscription
    PremiumMonthly,
    /// One-time pack of 10 analysis credits
    CreditsSmall,
    /// One-time pack of 50 analysis credits
    CreditsLarge,
}

impl BillingPlan {
    /// Parse a plan identifier from a request body
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            billing::PLAN_PREMIUM_MONTHLY => Some(Self::PremiumMonthly),
            billing::PLAN_CREDITS_SMALL => Some(Self::CreditsSmall),
            billing::PLAN_CREDITS_LARGE => Some(Self::CreditsLarge),
            _ => None,
        }
    }

    /// Stable identifier carried through Stripe metadata
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::PremiumMonthly => billing::PLAN_PREMIUM_MONTHLY,
            Self::CreditsSmall => billing::PLAN_CREDITS_SMALL,
            Self::CreditsLarge => billing::PLAN_CREDITS_LARGE,
        }
    }

    /// Display name shown on the Stripe checkout page
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::PremiumMonthly => "Dish Detective Premium (monthly)",
            Self::CreditsSmall => "Dish Detective 10 analysis credits",
            Self::CreditsLarge => "Dish Detective 50 analysis credits",
        }
    }

    /// Price in USD cents
    #[must_use]
    pub const fn amount_cents(&self) -> u64 {
        match self {
            Self::PremiumMonthly => billing::PREMIUM_MONTHLY_CENTS,
            Self::CreditsSmall => billing::CREDITS_SMALL_CENTS,
            Self::CreditsLarge => billing::CREDITS_LARGE_CENTS,
        }
    }

    /// Credits granted on completed payment; zero for subscriptions
    #[must_use]
    pub const fn credits(&self) -> i64 {
        match self {
            Self::PremiumMonthly => 0,
            Self::CreditsSmall => billing::CREDITS_SMALL_AMOUNT,
            Self::CreditsLarge => billing::CREDITS_LARGE_AMOUNT,
        }
    }

    const fn is_subscription(&self) -> bool {
        matches!(self, Self::PremiumMonthly)
    }
}

/// A created checkout session the client is redirected to
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,
    /// Hosted checkout URL
    pub url: String,
}

/// A verified webhook event
#[derive(Debug, Clone)]
pub struct StripeEvent {
    /// Event type, e.g. `checkout.session.completed`
    pub event_type: String,
    /// The event's `data.object` payload
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: serde_json::Value,
}

/// Stripe REST client
pub struct StripeClient {
    secret_key: String,
    webhook_secret: Option<String>,
    client: Client,
}

impl StripeClient {
    #[must_use]
    pub fn new(secret_key: impl Into<String>, webhook_secret: Option<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret,
            client: Client::new(),
        }
    }

    /// Create a hosted checkout session for a plan
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe API call fails.
    pub async fn create_checkout_session(
        &self,
        plan: BillingPlan,
        user_id: &str,
        customer_email: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, AppError> {
        let amount = plan.amount_cents().to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][product_data][name]", plan.display_name()),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("customer_email", customer_email),
            ("client_reference_id", user_id),
            ("metadata[plan]", plan.id()),
            ("metadata[user_id]", user_id),
        ];
        if plan.is_subscription() {
            form.push(("mode", "subscription"));
            form.push(("line_items[0][price_data][recurring][interval]", "month"));
            // Copied onto the subscription so cancellation webhooks can
            // identify the user without a customer lookup.
            form.push(("subscription_data[metadata][user_id]", user_id));
        } else {
            form.push(("mode", "payment"));
        }

        let response = self
            .client
            .post(CHECKOUT_SESSIONS_URL)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::external_service("stripe", e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::external_service("stripe", e.to_string()))?;

        if !status.is_success() {
            return Err(AppError::external_service(
                "stripe",
                format!("checkout session creation failed ({status}): {body}"),
            ));
        }

        let session: CheckoutSession = serde_json::from_str(&body)
            .map_err(|e| AppError::external_service("stripe", format!("unexpected response: {e}")))?;
        debug!(session_id = %session.id, plan = plan.id(), "created checkout session");
        Ok(session)
    }

    /// Verify a webhook payload against its `Stripe-Signature` header
    ///
    /// The signed payload is `"{timestamp}.{body}"` and must carry a `v1`
    /// HMAC-SHA256 signature within the tolerance window.
    ///
    /// # Errors
    ///
    /// Returns a config error when no webhook secret is set, `auth_invalid`
    /// for malformed headers, stale timestamps, or signature mismatches, and
    /// `invalid_input` for bodies that verify but are not valid event JSON.
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, AppError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::config("Stripe webhook secret is not configured"))?;

        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;
        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => signature = hex::decode(value).ok(),
                _ => {}
            }
        }
        let timestamp = timestamp
            .ok_or_else(|| AppError::auth_invalid("Stripe signature header missing timestamp"))?;
        let signature = signature
            .ok_or_else(|| AppError::auth_invalid("Stripe signature header missing v1 signature"))?;

        if (Utc::now().timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(AppError::auth_invalid(
                "Stripe signature timestamp outside tolerance",
            ));
        }

        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let mut signed_payload = timestamp.to_string().into_bytes();
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(payload);
        hmac::verify(&key, &signed_payload, &signature)
            .map_err(|_| AppError::auth_invalid("Stripe signature mismatch"))?;

        let envelope: WebhookEnvelope = serde_json::from_slice(payload)
            .map_err(|e| AppError::invalid_input(format!("Malformed webhook payload: {e}")))?;
        Ok(StripeEvent {
            event_type: envelope.event_type,
            data: envelope.data.object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let mut signed = timestamp.to_string().into_bytes();
        signed.push(b'.');
        signed.extend_from_slice(payload);
        let tag = hmac::sign(&key, &signed);
        format!("t={timestamp},v1={}", hex::encode(tag.as_ref()))
    }

    #[test]
    fn test_plan_parsing() {
        assert_eq!(
            BillingPlan::from_id("premium-monthly"),
            Some(BillingPlan::PremiumMonthly)
        );
        assert_eq!(BillingPlan::from_id("credits-10"), Some(BillingPlan::CreditsSmall));
        assert_eq!(BillingPlan::from_id("gold-plated"), None);
        assert_eq!(BillingPlan::CreditsLarge.credits(), 50);
    }

    #[test]
    fn test_webhook_round_trip() {
        let client = StripeClient::new("sk_test_x", Some("whsec_test".to_owned()));
        let payload =
            br#"{"type": "checkout.session.completed", "data": {"object": {"id": "cs_1"}}}"#;
        let header = sign("whsec_test", Utc::now().timestamp(), payload);

        let event = client.verify_webhook(payload, &header).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data["id"], "cs_1");
    }

    #[test]
    fn test_webhook_rejects_bad_signature_and_stale_timestamp() {
        let client = StripeClient::new("sk_test_x", Some("whsec_test".to_owned()));
        let payload = br#"{"type": "x", "data": {"object": {}}}"#;

        let wrong_secret = sign("whsec_other", Utc::now().timestamp(), payload);
        assert!(client.verify_webhook(payload, &wrong_secret).is_err());

        let stale = sign("whsec_test", Utc::now().timestamp() - 3600, payload);
        assert!(client.verify_webhook(payload, &stale).is_err());

        assert!(client.verify_webhook(payload, "garbage").is_err());
    }
}
