/// Token ledger endpoints
///
/// - `GET /v1/tokens/balance` - Caller's balance
/// - `GET /v1/tokens/history?limit=` - Caller's transactions, newest first
/// - `POST /v1/tokens/use` - Spend tokens on an AI tool
/// - `POST /v1/tokens/purchase` - Credit a succeeded Stripe payment
/// - `POST /v1/tokens/adjust` - Admin correction
///
/// All routes require a bearer token; balances are keyed by the caller's
/// user id.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    integrations::stripe::StripeClient,
};
use atelier_shared::{
    auth::middleware::AuthContext,
    ledger::LedgerEntry,
    models::{ai_tool::AiTool, token::TokenTransaction},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// History rows returned when no limit is given
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Largest correction an admin can apply in one call, either sign
pub const MAX_ADJUST_DELTA: i64 = 1_000_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UseToolRequest {
    /// Slug of the tool to use
    #[validate(length(min = 1, max = 100, message = "Tool slug is required"))]
    pub tool: String,
}

#[derive(Debug, Serialize)]
pub struct UseToolResponse {
    pub tool: AiTool,
    #[serde(flatten)]
    pub entry: LedgerEntry,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseRequest {
    #[validate(length(min = 1, message = "Payment intent id is required"))]
    pub payment_intent_id: String,

    /// Expected token amount; must match what the intent was created for
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustRequest {
    #[validate(length(min = 1, max = 255, message = "User id is required"))]
    pub user_id: String,

    /// Signed token delta
    #[validate(range(
        min = -MAX_ADJUST_DELTA,
        max = MAX_ADJUST_DELTA,
        message = "Delta must be within one million tokens"
    ))]
    pub delta: i64,

    #[validate(length(max = 255, message = "Reason must be at most 255 characters"))]
    pub reason: Option<String>,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BalanceResponse>> {
    let user_id = auth.ledger_user_id();
    let balance = state.ledger().get_balance(&user_id).await?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<TokenTransaction>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state.ledger().history(&auth.ledger_user_id(), limit).await?;

    Ok(Json(history))
}

/// Spends the tool's token cost
///
/// # Errors
///
/// - `402 Payment Required`: Balance lower than the tool's cost
/// - `404 Not Found`: Unknown or inactive tool
pub async fn use_tool(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UseToolRequest>,
) -> ApiResult<Json<UseToolResponse>> {
    req.validate()?;

    let (tool, entry) = state
        .ledger()
        .use_tool(&auth.ledger_user_id(), &req.tool)
        .await?;

    Ok(Json(UseToolResponse { tool, entry }))
}

/// Confirms a purchase from the client side after Stripe.js succeeds
///
/// The intent is read back from Stripe; tokens are credited only when it
/// succeeded and was created for the caller. Safe to call more than once
/// and alongside the webhook: each intent is credited at most once.
pub async fn confirm_purchase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<Json<LedgerEntry>> {
    req.validate()?;

    let stripe = StripeClient::new(&state.http, state.config.stripe.as_ref())?;
    let intent = stripe.retrieve_payment_intent(&req.payment_intent_id).await?;
    let user_id = auth.ledger_user_id();

    if intent.user_id() != Some(user_id.as_str()) {
        tracing::warn!(user_id = %user_id, payment_intent_id = %intent.id, "Purchase for another user's payment");
        return Err(ApiError::Forbidden(
            "Payment belongs to another user".to_string(),
        ));
    }

    if !intent.succeeded() {
        return Err(ApiError::BadRequest(format!(
            "Payment has not succeeded (status: {})",
            intent.status
        )));
    }

    let tokens = intent
        .tokens()
        .ok_or_else(|| ApiError::BadRequest("Payment carries no token amount".to_string()))?;

    if matches!(req.amount, Some(amount) if amount != tokens) {
        return Err(ApiError::BadRequest(format!(
            "Amount does not match payment ({} tokens)",
            tokens
        )));
    }

    let entry = state
        .ledger()
        .purchase(&user_id, tokens, Some(&intent.id))
        .await?;

    Ok(Json(entry))
}

pub async fn adjust_balance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<LedgerEntry>> {
    req.validate()?;

    let entry = state
        .ledger()
        .adjust(&req.user_id, req.delta, req.reason.as_deref())
        .await?;

    tracing::info!(admin_id = %auth.user_id, user_id = %req.user_id, delta = req.delta, "Admin adjusted tokens");
    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjust(delta: i64) -> AdjustRequest {
        AdjustRequest {
            user_id: "u1".to_string(),
            delta,
            reason: None,
        }
    }

    #[test]
    fn test_adjust_delta_bounds() {
        assert!(adjust(MAX_ADJUST_DELTA).validate().is_ok());
        assert!(adjust(-MAX_ADJUST_DELTA).validate().is_ok());
        assert!(adjust(MAX_ADJUST_DELTA + 1).validate().is_err());
        assert!(adjust(i64::MIN).validate().is_err());
        assert!(adjust(i64::MAX).validate().is_err());
    }
}
