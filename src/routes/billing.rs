// ABOUTME: Billing routes for Stripe checkout, webhook dispatch, and status lookup
// ABOUTME: The webhook endpoint is unauthenticated but signature-verified
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing routes
//!
//! Checkout sessions are created against fixed plans; completed payments
//! and subscription cancellations arrive as signed webhooks that update the
//! user row. When Stripe is not configured, the action routes fail with a
//! config error and the status route still works.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::external::{BillingPlan, StripeClient, StripeEvent};
use crate::models::SubscriptionStatus;
use crate::resources::ServerResources;
use crate::routes::authenticate;
use crate::storage::StorageProvider;

const DEFAULT_SUCCESS_URL: &str = "https://dishdetective.app/billing/success";
const DEFAULT_CANCEL_URL: &str = "https://dishdetective.app/billing/cancelled";

/// Checkout request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Plan identifier: `premium-monthly`, `credits-10`, or `credits-50`
    pub plan: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Checkout response with the hosted payment URL
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub session_id: String,
    pub checkout_url: String,
}

/// Billing status for the authenticated user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStatusResponse {
    pub subscription_status: String,
    pub credits: i64,
}

/// Billing route group
pub struct BillingRoutes;

impl BillingRoutes {
    /// Build the `/api/billing` router
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/billing/checkout", post(create_checkout))
            .route("/api/billing/webhook", post(handle_webhook))
            .route("/api/billing/status", get(billing_status))
            .with_state(resources)
    }
}

fn stripe_client(resources: &ServerResources) -> Result<&StripeClient, AppError> {
    resources
        .stripe
        .as_ref()
        .ok_or_else(|| AppError::config("Billing is not configured on this server"))
}

async fn create_checkout(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    let auth = authenticate(&resources, &headers).await?;
    let stripe = stripe_client(&resources)?;

    let plan = BillingPlan::from_id(&request.plan)
        .ok_or_else(|| AppError::invalid_input(format!("Unknown plan: {}", request.plan)))?;

    let session = stripe
        .create_checkout_session(
            plan,
            &auth.user.id.to_string(),
            &auth.user.email,
            request.success_url.as_deref().unwrap_or(DEFAULT_SUCCESS_URL),
            request.cancel_url.as_deref().unwrap_or(DEFAULT_CANCEL_URL),
        )
        .await?;

    info!(user_id = %auth.user.id, plan = plan.id(), "created checkout session");
    Ok(Json(CheckoutResponse {
        success: true,
        session_id: session.id,
        checkout_url: session.url,
    }))
}

/// Extract the user id a webhook event refers to
fn event_user_id(event: &StripeEvent) -> Result<Uuid, AppError> {
    let id = event.data["metadata"]["user_id"]
        .as_str()
        .or_else(|| event.data["client_reference_id"].as_str())
        .ok_or_else(|| AppError::invalid_input("Webhook event carries no user reference"))?;
    Uuid::parse_str(id).map_err(|_| AppError::invalid_input("Webhook user reference is not a UUID"))
}

async fn apply_event(resources: &ServerResources, event: &StripeEvent) -> Result<(), AppError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let user_id = event_user_id(event)?;
            let mut user = resources
                .storage
                .get_user(user_id)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
                .ok_or_else(|| AppError::not_found("User"))?;

            if let Some(customer) = event.data["customer"].as_str() {
                user.stripe_customer_id = Some(customer.to_owned());
            }

            let plan = event.data["metadata"]["plan"]
                .as_str()
                .and_then(BillingPlan::from_id);
            match plan {
                Some(BillingPlan::PremiumMonthly) => {
                    user.subscription_status = SubscriptionStatus::Premium;
                    info!(user_id = %user.id, "subscription activated");
                }
                Some(pack) => {
                    user.credits += pack.credits();
                    info!(user_id = %user.id, credits = user.credits, "credits purchased");
                }
                None => {
                    warn!(user_id = %user.id, "completed checkout without a recognized plan");
                }
            }

            resources
                .storage
                .update_user(&user)
                .await
                .map_err(|e| AppError::database(e.to_string()))
        }
        "customer.subscription.deleted" => {
            let user_id = event_user_id(event)?;
            let mut user = resources
                .storage
                .get_user(user_id)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
                .ok_or_else(|| AppError::not_found("User"))?;
            user.subscription_status = SubscriptionStatus::Cancelled;
            info!(user_id = %user.id, "subscription cancelled");
            resources
                .storage
                .update_user(&user)
                .await
                .map_err(|e| AppError::database(e.to_string()))
        }
        other => {
            // Unhandled event types are acknowledged so Stripe stops retrying
            info!(event_type = %other, "ignoring unhandled webhook event");
            Ok(())
        }
    }
}

async fn handle_webhook(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let stripe = stripe_client(&resources)?;
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::auth_invalid("Missing Stripe-Signature header"))?;

    let event = stripe.verify_webhook(&body, signature)?;
    apply_event(&resources, &event).await?;
    Ok(Json(serde_json::json!({ "received": true })))
}

async fn billing_status(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<BillingStatusResponse>> {
    let auth = authenticate(&resources, &headers).await?;
    Ok(Json(BillingStatusResponse {
        subscription_status: auth.user.subscription_status.as_str().to_owned(),
        credits: auth.user.credits,
    }))
}
