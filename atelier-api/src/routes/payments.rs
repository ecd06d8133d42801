/// Stripe token purchases
///
/// - `POST /v1/payments/intent` - Create a PaymentIntent for a token package
/// - `POST /v1/payments/webhook` - Stripe event receiver (signature checked)
///
/// A purchase starts as a `pending` transaction. The webhook (or
/// `POST /v1/tokens/purchase`) completes it and credits the tokens; a
/// `payment_intent.payment_failed` event marks it `failed`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    integrations::stripe::{verify_webhook_signature, PaymentIntent, StripeClient, WebhookEvent},
};
use atelier_shared::{
    auth::middleware::AuthContext,
    models::token::{CreateTokenTransaction, TokenTransaction, TransactionKind, TransactionStatus},
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub const CURRENCY: &str = "usd";

/// Token package offered for sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenPackage {
    pub id: &'static str,
    pub tokens: i64,
    pub price_cents: i64,
}

pub const PACKAGES: &[TokenPackage] = &[
    TokenPackage {
        id: "starter",
        tokens: 100,
        price_cents: 500,
    },
    TokenPackage {
        id: "creator",
        tokens: 500,
        price_cents: 2000,
    },
    TokenPackage {
        id: "studio",
        tokens: 1500,
        price_cents: 5000,
    },
];

pub fn find_package(id: &str) -> Option<&'static TokenPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub package: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount_cents: i64,
    pub tokens: i64,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Creates a PaymentIntent for a package and records it as pending
///
/// # Errors
///
/// - `400 Bad Request`: Unknown package
/// - `503 Service Unavailable`: Stripe not configured
pub async fn create_intent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateIntentRequest>,
) -> ApiResult<(StatusCode, Json<CreateIntentResponse>)> {
    let package = find_package(&req.package)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown package '{}'", req.package)))?;

    let stripe = StripeClient::new(&state.http, state.config.stripe.as_ref())?;
    let user_id = auth.ledger_user_id();

    let intent = stripe
        .create_payment_intent(
            package.price_cents,
            CURRENCY,
            &[
                ("user_id", user_id.clone()),
                ("tokens", package.tokens.to_string()),
                ("package", package.id.to_string()),
            ],
        )
        .await?;

    TokenTransaction::create(
        &state.db,
        CreateTokenTransaction {
            user_id: user_id.clone(),
            amount: package.tokens,
            kind: TransactionKind::Purchase,
            tool_id: None,
            payment_intent_id: Some(intent.id.clone()),
            note: Some(format!("package:{}", package.id)),
            status: TransactionStatus::Pending,
        },
    )
    .await?;

    tracing::info!(user_id = %user_id, payment_intent_id = %intent.id, package = package.id, "Payment intent created");

    Ok((
        StatusCode::CREATED,
        Json(CreateIntentResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount_cents: package.price_cents,
            tokens: package.tokens,
        }),
    ))
}

/// Receives Stripe events
///
/// Needs the raw body for signature verification, so it takes `Bytes`
/// rather than `Json`. Unknown event types are acknowledged and ignored.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let stripe = StripeClient::new(&state.http, state.config.stripe.as_ref())?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    verify_webhook_signature(&body, signature, stripe.webhook_secret(), Utc::now().timestamp())?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent = payment_intent(event.data.object)?;
            credit_intent(&state, &intent).await?;
        }
        "payment_intent.payment_failed" => {
            let intent = payment_intent(event.data.object)?;
            state.ledger().mark_failed(&intent.id).await?;
        }
        other => {
            tracing::debug!(event_type = %other, "Ignoring Stripe event");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

fn payment_intent(object: serde_json::Value) -> ApiResult<PaymentIntent> {
    serde_json::from_value(object)
        .map_err(|e| ApiError::BadRequest(format!("Invalid payment intent: {}", e)))
}

async fn credit_intent(state: &AppState, intent: &PaymentIntent) -> ApiResult<()> {
    let (Some(user_id), Some(tokens)) = (intent.user_id(), intent.tokens()) else {
        // Intent not created by this API
        tracing::warn!(payment_intent_id = %intent.id, "Succeeded intent without token metadata");
        return Ok(());
    };

    let entry = state.ledger().purchase(user_id, tokens, Some(&intent.id)).await?;

    if entry.duplicate {
        tracing::debug!(payment_intent_id = %intent.id, "Purchase already credited");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages() {
        assert_eq!(find_package("starter").map(|p| p.tokens), Some(100));
        assert_eq!(find_package("creator").map(|p| p.price_cents), Some(2000));
        assert_eq!(find_package("studio").map(|p| p.tokens), Some(1500));
        assert!(find_package("platinum").is_none());
    }

    #[test]
    fn test_larger_packages_are_cheaper_per_token() {
        let per_token: Vec<f64> = PACKAGES
            .iter()
            .map(|p| p.price_cents as f64 / p.tokens as f64)
            .collect();

        assert!(per_token.windows(2).all(|w| w[1] < w[0]));
    }
}
