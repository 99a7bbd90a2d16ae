use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;
use crate::ratelimit::client_key;
use crate::AppState;

use super::too_many_requests;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tenancy_id: Uuid,
    pub amount_pence: i64,
    pub description: Option<String>,
}

/// POST /api/billing/checkout - create a payment checkout session.
///
/// The admission check runs before any other work; a rejected request has no
/// side effects.
pub async fn checkout_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequest>,
) -> Result<Response, ApiError> {
    let api = &config::config().api;
    let key = format!("checkout:{}", client_key(&headers));
    let outcome = state
        .limiter
        .check(&key, api.rate_limit_requests, api.rate_limit_window_secs);
    if !outcome.success {
        tracing::warn!("checkout rate limit hit for {}", key);
        return Ok(too_many_requests());
    }

    if body.amount_pence <= 0 {
        return Err(ApiError::bad_request("Amount must be a positive number of pence"));
    }

    // The payments provider owns the real session; this records what we send it
    let checkout_session_id = Uuid::new_v4();
    tracing::info!(
        "checkout session {} created for tenancy {} ({}p)",
        checkout_session_id,
        body.tenancy_id,
        body.amount_pence
    );

    Ok((
        [
            ("x-ratelimit-remaining", outcome.remaining.to_string()),
            ("x-ratelimit-reset", outcome.reset_at.timestamp().to_string()),
        ],
        Json(json!({
            "success": true,
            "data": {
                "checkout_session_id": checkout_session_id,
                "tenancy_id": body.tenancy_id,
                "amount_pence": body.amount_pence,
                "description": body.description,
                "status": "created",
            }
        })),
    )
        .into_response())
}
