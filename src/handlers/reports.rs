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
pub struct ExportRequest {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub format: Option<String>,
}

/// POST /api/reports/export - queue a report export. Admission-checked before
/// any work, same contract as checkout.
pub async fn export_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let api = &config::config().api;
    let key = format!("export:{}", client_key(&headers));
    let outcome = state
        .limiter
        .check(&key, api.rate_limit_requests, api.rate_limit_window_secs);
    if !outcome.success {
        tracing::warn!("report export rate limit hit for {}", key);
        return Ok(too_many_requests());
    }

    let format = body.format.unwrap_or_else(|| "pdf".to_string());
    if !matches!(format.as_str(), "pdf" | "csv") {
        return Err(ApiError::bad_request("Format must be 'pdf' or 'csv'"));
    }

    let report_id = Uuid::new_v4();
    tracing::info!("report export {} queued ({})", report_id, format);

    Ok((
        [
            ("x-ratelimit-remaining", outcome.remaining.to_string()),
            ("x-ratelimit-reset", outcome.reset_at.timestamp().to_string()),
        ],
        Json(json!({
            "success": true,
            "data": {
                "report_id": report_id,
                "from": body.from,
                "to": body.to,
                "format": format,
                "status": "queued",
            }
        })),
    )
        .into_response())
}
